use crate::config::Config;
use crate::error::AppError;
use crate::model::{Task, TaskId, title_key};
use crate::storage::json_store;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::Date;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub sort_on_load: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { sort_on_load: true }
    }
}

#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    options: StoreOptions,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        let path = path.into();
        let mut tasks = match json_store::load_tasks(&path) {
            Ok(tasks) => {
                debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "could not load tasks, starting with an empty list"
                );
                Vec::new()
            }
        };

        if options.sort_on_load {
            sort_by_due_date(&mut tasks);
        }

        Self {
            path,
            options,
            tasks,
        }
    }

    pub fn open_with_config(config: &Config) -> Result<Self, AppError> {
        let path = json_store::store_path(config)?;
        Ok(Self::open(path, config.store_options()))
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn add(&mut self, title: &str) -> Result<Task, AppError> {
        self.add_with_details(title, false, None)
    }

    pub fn add_with_details(
        &mut self,
        title: &str,
        is_completed: bool,
        due_date: Option<Date>,
    ) -> Result<Task, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::EmptyTitle);
        }
        self.ensure_title_available(trimmed, None)?;

        let task = Task::new(trimmed)
            .with_completed(is_completed)
            .with_due_date(due_date);
        self.tasks.push(task.clone());
        self.save();

        Ok(task)
    }

    pub fn toggle_completion(&mut self, id: TaskId) -> Result<Task, AppError> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        task.is_completed = !task.is_completed;
        let toggled = task.clone();
        self.save();

        Ok(toggled)
    }

    /// Any out-of-range index rejects the whole call.
    pub fn delete(&mut self, indices: &BTreeSet<usize>) -> Result<Vec<Task>, AppError> {
        if let Some(&index) = indices.last()
            && index >= self.tasks.len()
        {
            return Err(AppError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::with_capacity(indices.len());
        let mut kept = Vec::with_capacity(self.tasks.len() - indices.len());
        for (index, task) in std::mem::take(&mut self.tasks).into_iter().enumerate() {
            if indices.contains(&index) {
                removed.push(task);
            } else {
                kept.push(task);
            }
        }
        self.tasks = kept;
        self.save();

        Ok(removed)
    }

    pub fn update(
        &mut self,
        id: TaskId,
        new_title: &str,
        new_due_date: Option<Date>,
    ) -> Result<Task, AppError> {
        let index = self.position(id)?;

        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            return Err(AppError::EmptyTitle);
        }
        self.ensure_title_available(trimmed, Some(id))?;

        let task = &mut self.tasks[index];
        task.title = trimmed.to_string();
        task.due_date = new_due_date;
        let updated = task.clone();
        self.save();

        Ok(updated)
    }

    pub fn persist(&self) -> Result<(), AppError> {
        json_store::save_tasks(&self.path, &self.tasks)?;
        debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    fn save(&self) {
        if let Err(err) = self.persist() {
            warn!(
                path = %self.path.display(),
                error = %err,
                "could not save tasks, keeping in-memory changes"
            );
        }
    }

    fn position(&self, id: TaskId) -> Result<usize, AppError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(AppError::NotFound(id))
    }

    fn ensure_title_available(&self, title: &str, except: Option<TaskId>) -> Result<(), AppError> {
        let key = title_key(title);
        let taken = self
            .tasks
            .iter()
            .filter(|task| Some(task.id) != except)
            .any(|task| task.title_key() == key);
        if taken {
            return Err(AppError::DuplicateTitle(title.to_string()));
        }
        Ok(())
    }
}

// Undated tasks sort last.
fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| match (left.due_date, right.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
