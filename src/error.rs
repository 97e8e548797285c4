use thiserror::Error;

/// Errors raised at the edges of the classifier: configuration, control
/// command parsing and recorded-log I/O. The per-sample path never fails.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown control command: {0}")]
    UnknownCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
