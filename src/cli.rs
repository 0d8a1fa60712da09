use crate::classifier::{Classifier, HttpClassifier, KeywordClassifier};
use crate::triage::TriageOptions;
use clap::Parser;

/// Move spam from an IMAP mailbox into the trash.
#[derive(Parser, Debug, Clone)]
#[command(name = "spam-sweeper", version, about)]
pub struct Cli {
    /// IMAP server host name.
    #[arg(long)]
    pub host: String,

    /// Login user name.
    #[arg(long)]
    pub user: String,

    /// Login password.
    #[arg(long, env = "SPAM_SWEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// IMAP server port.
    #[arg(long, default_value_t = 993)]
    pub port: u16,

    /// Mailbox to scan.
    #[arg(long, default_value = "INBOX")]
    pub mailbox: String,

    /// Classify and log only; never copy, flag or expunge.
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many messages (newest first).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Plain TCP instead of TLS. Pick a matching --port yourself.
    #[arg(long)]
    pub no_ssl: bool,

    /// Preferred trash folder; created if no known trash folder exists.
    #[arg(long, default_value = "Trash")]
    pub trash_folder: String,

    /// Prediction service endpoint, e.g. http://localhost:9000/predict/
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Keyword rule hits needed to call a message spam.
    #[arg(long, default_value_t = 2)]
    pub threshold: usize,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn triage_options(&self) -> TriageOptions {
        TriageOptions {
            mailbox: self.mailbox.clone(),
            dry_run: self.dry_run,
            limit: self.limit,
            trash_folder: self.trash_folder.clone(),
        }
    }

    pub fn classifier(&self) -> Box<dyn Classifier> {
        match &self.classifier_url {
            Some(url) => Box::new(HttpClassifier::new(url.clone())),
            None => Box::new(KeywordClassifier::new(self.threshold)),
        }
    }
}
