// backupper/src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("{0}")]
    Validation(String),

    #[error("Cannot handle adapter '{0}'")]
    UnsupportedAdapter(String),

    #[error("Failed to connect to {0}: {1}")]
    Connection(String, String),

    #[error("Remote command failed with status {status}: {stderr}")]
    Command { status: i32, stderr: String },

    #[error("Transfer of {0} failed: {1}")]
    Transfer(String, String),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;
