pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_store;

pub use error::AppError;
pub use model::{Task, TaskId};
pub use task_store::{StoreOptions, TaskStore};
