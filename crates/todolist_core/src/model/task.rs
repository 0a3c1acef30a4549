use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;
use uuid::Uuid;

time::serde::format_description!(due_date_format, Date, "[year]-[month]-[day]");

/// Opaque task identifier. Serialized as a hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub is_completed: bool,
    #[serde(
        default,
        with = "due_date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Date>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            is_completed: false,
            due_date: None,
        }
    }

    pub fn with_completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<Date>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Case-folded form of the trimmed title, used for duplicate detection.
    pub(crate) fn title_key(&self) -> String {
        title_key(&self.title)
    }
}

pub(crate) fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}
