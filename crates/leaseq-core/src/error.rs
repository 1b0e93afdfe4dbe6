use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("internal state error: {0}")]
    InternalState(String),

    #[error("invalid task record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
