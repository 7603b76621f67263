use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("session is {0}, expected running")]
    NotRunning(&'static str),

    #[error("session already started")]
    AlreadyStarted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("overseer transport error: {0}")]
    Transport(String),

    #[error("failed to decode action: {0}")]
    DecodeAction(String),

    #[error("action execution failed: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
