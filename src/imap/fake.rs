//! In-memory `MailSession` that records every protocol call.

use super::{FolderInfo, MailSession, MessageHandle};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Select(String),
    Search,
    Fetch(u32),
    Copy(u32, String),
    MarkDeleted(u32),
    Expunge,
    List(String),
    Create(String),
    Logout,
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub calls: Vec<Call>,
    pub mailboxes: HashSet<String>,
    pub folders: HashSet<String>,
    pub messages: HashMap<u32, Vec<u8>>,
    pub fail_fetch: HashSet<u32>,
    pub fail_copy: HashSet<u32>,
    pub fail_mark: HashSet<u32>,
    /// Removed by another client right after SEARCH.
    pub vanish_after_search: HashSet<u32>,
    pub fail_expunge: bool,
    pub fail_search: bool,
    pub fail_create: bool,
    pub fail_logout: bool,
}

impl FakeSession {
    pub fn with_inbox(messages: Vec<(u32, Vec<u8>)>) -> Self {
        Self {
            mailboxes: HashSet::from(["INBOX".to_string()]),
            messages: messages.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

#[async_trait]
impl MailSession for FakeSession {
    async fn select(&mut self, mailbox: &str) -> Result<(), AppError> {
        self.calls.push(Call::Select(mailbox.to_string()));
        if self.mailboxes.contains(mailbox) {
            Ok(())
        } else {
            Err(AppError::Mailbox {
                mailbox: mailbox.to_string(),
                reason: "NO Mailbox doesn't exist".to_string(),
            })
        }
    }

    async fn search_all(&mut self) -> Result<Vec<MessageHandle>, AppError> {
        self.calls.push(Call::Search);
        if self.fail_search {
            return Err(AppError::Protocol("BAD malformed SEARCH".to_string()));
        }
        let mut handles: Vec<MessageHandle> =
            self.messages.keys().copied().map(MessageHandle).collect();
        handles.sort();
        for uid in &self.vanish_after_search {
            self.messages.remove(uid);
        }
        Ok(handles)
    }

    async fn fetch_raw(&mut self, handle: MessageHandle) -> Result<Vec<u8>, AppError> {
        self.calls.push(Call::Fetch(handle.0));
        if self.fail_fetch.contains(&handle.0) {
            return Err(AppError::Fetch {
                handle: handle.0,
                reason: "connection reset".to_string(),
            });
        }
        self.messages.get(&handle.0).cloned().ok_or(AppError::Fetch {
            handle: handle.0,
            reason: "no such message".to_string(),
        })
    }

    async fn copy(&mut self, handle: MessageHandle, folder: &str) -> Result<(), AppError> {
        self.calls.push(Call::Copy(handle.0, folder.to_string()));
        if self.fail_copy.contains(&handle.0) {
            return Err(AppError::Copy {
                handle: handle.0,
                folder: folder.to_string(),
                reason: "NO [TRYCREATE] no such mailbox".to_string(),
            });
        }
        Ok(())
    }

    async fn mark_deleted(&mut self, handle: MessageHandle) -> Result<(), AppError> {
        self.calls.push(Call::MarkDeleted(handle.0));
        if self.fail_mark.contains(&handle.0) {
            return Err(AppError::Store {
                handle: handle.0,
                reason: "NO [READ-ONLY] mailbox is read-only".to_string(),
            });
        }
        Ok(())
    }

    async fn expunge(&mut self) -> Result<(), AppError> {
        self.calls.push(Call::Expunge);
        if self.fail_expunge {
            return Err(AppError::Protocol("NO EXPUNGE failed".to_string()));
        }
        Ok(())
    }

    async fn list_folders(&mut self, pattern: &str) -> Result<Vec<FolderInfo>, AppError> {
        self.calls.push(Call::List(pattern.to_string()));
        Ok(self
            .folders
            .iter()
            .filter(|f| f.as_str() == pattern)
            .map(|f| FolderInfo {
                name: f.clone(),
                delimiter: Some("/".to_string()),
            })
            .collect())
    }

    async fn create_folder(&mut self, name: &str) -> Result<(), AppError> {
        self.calls.push(Call::Create(name.to_string()));
        if self.fail_create {
            return Err(AppError::Folder {
                folder: name.to_string(),
                reason: "NO permission denied".to_string(),
            });
        }
        self.folders.insert(name.to_string());
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), AppError> {
        self.calls.push(Call::Logout);
        if self.fail_logout {
            return Err(AppError::Protocol("connection closed".to_string()));
        }
        Ok(())
    }
}
