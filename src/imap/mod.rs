pub mod session;
pub mod trash;

#[cfg(test)]
pub mod fake;

use crate::error::AppError;
use async_native_tls::TlsStream;
use async_std::net::TcpStream;
use async_trait::async_trait;
use session::ImapSession;
use std::fmt;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// UID of a message in the selected mailbox.
///
/// Unlike sequence numbers, a UID keeps pointing at the same message when
/// another client expunges during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageHandle(pub u32);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub delimiter: Option<String>,
}

/// The protocol operations a triage run needs from an authenticated session.
#[async_trait]
pub trait MailSession: Send {
    async fn select(&mut self, mailbox: &str) -> Result<(), AppError>;

    /// All handles in the selected mailbox, in ascending order.
    async fn search_all(&mut self) -> Result<Vec<MessageHandle>, AppError>;

    async fn fetch_raw(&mut self, handle: MessageHandle) -> Result<Vec<u8>, AppError>;

    async fn copy(&mut self, handle: MessageHandle, folder: &str) -> Result<(), AppError>;

    async fn mark_deleted(&mut self, handle: MessageHandle) -> Result<(), AppError>;

    async fn expunge(&mut self) -> Result<(), AppError>;

    async fn list_folders(&mut self, pattern: &str) -> Result<Vec<FolderInfo>, AppError>;

    async fn create_folder(&mut self, name: &str) -> Result<(), AppError>;

    async fn logout(&mut self) -> Result<(), AppError>;
}

/// A connected but not yet authenticated client.
pub enum Connection {
    Tls(async_imap::Client<TlsStream<TcpStream>>),
    Plain(async_imap::Client<TcpStream>),
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Tls(_) => f.write_str("Connection::Tls"),
            Connection::Plain(_) => f.write_str("Connection::Plain"),
        }
    }
}

pub async fn connect(host: &str, port: u16, use_tls: bool) -> Result<Connection, AppError> {
    let tcp = async_std::future::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
        .await
        .map_err(|_| AppError::Connection("TCP connect timed out after 30s".to_string()))?
        .map_err(|e| AppError::Connection(e.to_string()))?;

    if !use_tls {
        tracing::warn!("Connecting to {}:{} without TLS", host, port);
        return Ok(Connection::Plain(async_imap::Client::new(tcp)));
    }

    let tls = async_native_tls::TlsConnector::new();
    let tls_stream = tls.connect(host, tcp).await?;

    Ok(Connection::Tls(async_imap::Client::new(tls_stream)))
}

impl Connection {
    pub async fn authenticate(
        self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn MailSession>, AppError> {
        let session: Box<dyn MailSession> = match self {
            Connection::Tls(client) => Box::new(ImapSession::new(
                client
                    .login(user, password)
                    .await
                    .map_err(|(e, _)| AppError::Auth(e.to_string()))?,
            )),
            Connection::Plain(client) => Box::new(ImapSession::new(
                client
                    .login(user, password)
                    .await
                    .map_err(|(e, _)| AppError::Auth(e.to_string()))?,
            )),
        };
        tracing::info!("Logged in as {}", user);
        Ok(session)
    }
}
