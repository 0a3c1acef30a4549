mod task;

pub use task::{Task, TaskId};
pub(crate) use task::title_key;
