use crate::model::TaskId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("title is required")]
    EmptyTitle,
    #[error("a task titled '{0}' already exists")]
    DuplicateTitle(String),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("index {index} is out of range for {len} tasks")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidData(String),
    #[error("{0}")]
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::DuplicateTitle(_) => "duplicate_title",
            Self::NotFound(_) => "not_found",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }
}
