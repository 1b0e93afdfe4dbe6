mod snapshot;

pub use snapshot::{QueueRecord, SnapshotStore, SNAPSHOT_FILENAME};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt snapshot line {line}: {source}")]
    CorruptLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("task record error: {0}")]
    Record(#[from] leaseq_core::QueueError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
