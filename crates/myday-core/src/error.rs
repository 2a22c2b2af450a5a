use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("task not found: id={0}")]
    NotFound(u64),

    #[error("storage write failed: {0}")]
    Storage(String),

    #[error("stored tasks could not be decoded: {0}")]
    Deserialization(String),
}

pub type Result<T> = std::result::Result<T, TaskError>;
