use super::{FolderInfo, MailSession, MessageHandle};
use crate::error::AppError;
use async_trait::async_trait;
use futures::io::{AsyncRead, AsyncWrite};
use futures::StreamExt;
use std::fmt;

/// `MailSession` backed by a live async-imap session.
pub struct ImapSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    inner: async_imap::Session<T>,
}

impl<T> ImapSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    pub fn new(inner: async_imap::Session<T>) -> Self {
        Self { inner }
    }
}

impl<T> fmt::Debug for ImapSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> MailSession for ImapSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + fmt::Debug + Send,
{
    async fn select(&mut self, mailbox: &str) -> Result<(), AppError> {
        let selected = self
            .inner
            .select(mailbox)
            .await
            .map_err(|e| AppError::Mailbox {
                mailbox: mailbox.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Selected {} ({} messages)", mailbox, selected.exists);
        Ok(())
    }

    async fn search_all(&mut self) -> Result<Vec<MessageHandle>, AppError> {
        let uids = self
            .inner
            .uid_search("ALL")
            .await
            .map_err(|e| AppError::Protocol(e.to_string()))?;

        let mut handles: Vec<MessageHandle> = uids.into_iter().map(MessageHandle).collect();
        handles.sort();
        Ok(handles)
    }

    async fn fetch_raw(&mut self, handle: MessageHandle) -> Result<Vec<u8>, AppError> {
        let fetch_err = |reason: String| AppError::Fetch {
            handle: handle.0,
            reason,
        };

        let fetches = self
            .inner
            .uid_fetch(handle.to_string(), "BODY.PEEK[]")
            .await
            .map_err(|e| fetch_err(e.to_string()))?
            .collect::<Vec<_>>()
            .await;

        let mut body = None;
        for fetch_result in fetches {
            match fetch_result {
                Ok(fetch) if fetch.uid == Some(handle.0) => {
                    if let Some(bytes) = fetch.body() {
                        body = Some(bytes.to_vec());
                    }
                }
                // Unsolicited FETCH responses for other messages (flag updates)
                Ok(_) => {}
                Err(e) => return Err(fetch_err(e.to_string())),
            }
        }

        body.ok_or_else(|| fetch_err("server returned no message body".to_string()))
    }

    async fn copy(&mut self, handle: MessageHandle, folder: &str) -> Result<(), AppError> {
        self.inner
            .uid_copy(handle.to_string(), folder)
            .await
            .map_err(|e| AppError::Copy {
                handle: handle.0,
                folder: folder.to_string(),
                reason: e.to_string(),
            })
    }

    async fn mark_deleted(&mut self, handle: MessageHandle) -> Result<(), AppError> {
        let store_err = |reason: String| AppError::Store {
            handle: handle.0,
            reason,
        };

        let updates = self
            .inner
            .uid_store(handle.to_string(), "+FLAGS (\\Deleted)")
            .await
            .map_err(|e| store_err(e.to_string()))?
            .collect::<Vec<_>>()
            .await;

        for update in updates {
            update.map_err(|e| store_err(e.to_string()))?;
        }
        Ok(())
    }

    async fn expunge(&mut self) -> Result<(), AppError> {
        let removed = self
            .inner
            .expunge()
            .await?
            .collect::<Vec<_>>()
            .await;

        let mut count = 0usize;
        for seq in removed {
            seq?;
            count += 1;
        }
        tracing::info!("Expunged {} messages", count);
        Ok(())
    }

    async fn list_folders(&mut self, pattern: &str) -> Result<Vec<FolderInfo>, AppError> {
        let names = self
            .inner
            .list(Some(""), Some(pattern))
            .await
            .map_err(|e| AppError::Folder {
                folder: pattern.to_string(),
                reason: e.to_string(),
            })?
            .collect::<Vec<_>>()
            .await;

        let mut folders = Vec::new();
        for name in names {
            match name {
                Ok(name) => folders.push(FolderInfo {
                    name: name.name().to_string(),
                    delimiter: name.delimiter().map(str::to_string),
                }),
                Err(e) => tracing::warn!("Skipping unreadable LIST entry: {}", e),
            }
        }
        Ok(folders)
    }

    async fn create_folder(&mut self, name: &str) -> Result<(), AppError> {
        self.inner
            .create(name)
            .await
            .map_err(|e| AppError::Folder {
                folder: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn logout(&mut self) -> Result<(), AppError> {
        self.inner.logout().await?;
        Ok(())
    }
}
