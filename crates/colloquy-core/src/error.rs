use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the ambient layers: settings files and logging setup.
/// Session components report their own error types.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Configuration(String),
}
