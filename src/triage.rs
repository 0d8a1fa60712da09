use crate::classifier::Classifier;
use crate::decode::NormalizedMessage;
use crate::error::AppError;
use crate::imap::trash::resolve_trash_folder;
use crate::imap::{MailSession, MessageHandle};
use tracing::{error, info, warn};

const SUBJECT_LOG_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageOptions {
    pub mailbox: String,
    pub dry_run: bool,
    pub limit: Option<usize>,
    /// Preferred trash folder, looked up before the conventional names.
    pub trash_folder: String,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            mailbox: "INBOX".to_string(),
            dry_run: false,
            limit: None,
            trash_folder: "Trash".to_string(),
        }
    }
}

/// What a run did, for the summary line and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub fetch_failures: usize,
    pub classified: usize,
    pub spam: usize,
    pub moved: usize,
    pub copy_failures: usize,
    pub flag_failures: usize,
    pub expunged: bool,
}

/// Attempted-message count against the optional limit.
/// Fetch failures count as attempts.
#[derive(Debug, Clone, Copy)]
struct RunCounters {
    processed: usize,
    limit: Option<usize>,
}

impl RunCounters {
    fn new(limit: Option<usize>) -> Self {
        Self {
            processed: 0,
            limit,
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.processed >= limit)
    }

    fn record_attempt(&mut self) {
        self.processed += 1;
    }
}

/// State threaded through one run. The session is borrowed exclusively.
struct TriageContext<'a> {
    session: &'a mut dyn MailSession,
    classifier: &'a dyn Classifier,
    options: &'a TriageOptions,
    counters: RunCounters,
    trash: Option<String>,
    report: RunReport,
}

/// Scans the mailbox, newest first, and moves spam to the trash folder.
///
/// Only a failed SELECT is returned as an error. The session is logged out
/// before returning either way.
pub async fn run(
    session: &mut dyn MailSession,
    classifier: &dyn Classifier,
    options: &TriageOptions,
) -> Result<RunReport, AppError> {
    let mut ctx = TriageContext {
        session,
        classifier,
        options,
        counters: RunCounters::new(options.limit),
        trash: None,
        report: RunReport::default(),
    };

    let outcome = ctx.triage().await;
    logout_quietly(ctx.session).await;
    outcome.map(|()| ctx.report)
}

async fn logout_quietly(session: &mut dyn MailSession) {
    match session.logout().await {
        Ok(()) => info!("Logged out"),
        Err(e) => warn!("Failed to logout: {}", e),
    }
}

fn truncate_subject(subject: &str) -> String {
    subject.chars().take(SUBJECT_LOG_CHARS).collect()
}

impl TriageContext<'_> {
    async fn triage(&mut self) -> Result<(), AppError> {
        self.session.select(&self.options.mailbox).await?;

        let handles = match self.session.search_all().await {
            Ok(handles) => handles,
            Err(e) => {
                error!("Search failed in {}, nothing to do: {}", self.options.mailbox, e);
                return Ok(());
            }
        };
        info!(
            "Found {} messages in {}{}",
            handles.len(),
            self.options.mailbox,
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        for handle in handles.into_iter().rev() {
            if self.counters.limit_reached() {
                info!("Limit of {} messages reached", self.counters.processed);
                break;
            }
            self.counters.record_attempt();
            self.report.processed += 1;

            if let Err(e) = self.process_message(handle).await {
                warn!("Skipping message {}: {}", handle, e);
            }
        }

        if !self.options.dry_run {
            self.finalize().await;
        }

        let report = &self.report;
        info!(
            "Done: {} processed, {} classified, {} spam, {} moved, \
             {} fetch failures, {} copy failures, {} flag failures, expunged: {}",
            report.processed,
            report.classified,
            report.spam,
            report.moved,
            report.fetch_failures,
            report.copy_failures,
            report.flag_failures,
            report.expunged
        );
        Ok(())
    }

    async fn process_message(&mut self, handle: MessageHandle) -> Result<(), AppError> {
        let raw = match self.session.fetch_raw(handle).await {
            Ok(raw) => raw,
            Err(e) => {
                self.report.fetch_failures += 1;
                return Err(e);
            }
        };

        let message = NormalizedMessage::from_raw(&raw);
        let is_spam = self
            .classifier
            .is_spam(&message.classification_text())
            .await;
        self.report.classified += 1;
        info!(
            "[{}] {:?} -> {}",
            handle,
            truncate_subject(&message.subject),
            if is_spam { "SPAM" } else { "ham" }
        );

        if !is_spam {
            return Ok(());
        }
        self.report.spam += 1;

        if self.options.dry_run {
            info!(
                "[{}] dry run: would move to {}",
                handle, self.options.trash_folder
            );
            return Ok(());
        }

        let trash = self.trash_folder().await;
        if let Err(e) = self.session.copy(handle, &trash).await {
            self.report.copy_failures += 1;
            warn!("[{}] left in place: {}", handle, e);
            return Ok(());
        }

        if let Err(e) = self.session.mark_deleted(handle).await {
            self.report.flag_failures += 1;
            return Err(e);
        }
        self.report.moved += 1;
        info!("[{}] moved to {}", handle, trash);
        Ok(())
    }

    /// Resolved on first use and reused for the rest of the run.
    async fn trash_folder(&mut self) -> String {
        if let Some(trash) = &self.trash {
            return trash.clone();
        }
        let trash = resolve_trash_folder(&mut *self.session, &self.options.trash_folder).await;
        self.trash = Some(trash.clone());
        trash
    }

    async fn finalize(&mut self) {
        match self.session.expunge().await {
            Ok(()) => self.report.expunged = true,
            Err(e) => error!(
                "Expunge failed, flagged messages remain in {}: {}",
                self.options.mailbox, e
            ),
        }
    }
}
