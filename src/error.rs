use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Cannot select mailbox {mailbox}: {reason}")]
    Mailbox { mailbox: String, reason: String },

    #[error("IMAP error: {0}")]
    Protocol(String),

    #[error("Fetch of message {handle} failed: {reason}")]
    Fetch { handle: u32, reason: String },

    #[error("Copy of message {handle} to {folder} failed: {reason}")]
    Copy {
        handle: u32,
        folder: String,
        reason: String,
    },

    #[error("Flag update on message {handle} failed: {reason}")]
    Store { handle: u32, reason: String },

    #[error("Folder operation on {folder} failed: {reason}")]
    Folder { folder: String, reason: String },

    #[error("Classifier error: {0}")]
    Classifier(String),
}

impl From<async_imap::error::Error> for AppError {
    fn from(e: async_imap::error::Error) -> Self {
        AppError::Protocol(e.to_string())
    }
}

impl From<async_native_tls::Error> for AppError {
    fn from(e: async_native_tls::Error) -> Self {
        AppError::Tls(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Classifier(e.to_string())
    }
}
