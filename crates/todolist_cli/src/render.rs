use tabled::settings::Style;
use tabled::{Table, Tabled};
use todolist_core::{AppError, Task};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    index: usize,
    done: String,
    title: String,
    due: String,
    id: String,
}

fn row(index: usize, task: &Task) -> TaskRow {
    TaskRow {
        index,
        done: if task.is_completed { "x" } else { " " }.to_string(),
        title: task.title.clone(),
        due: task
            .due_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
        id: task.id.to_string(),
    }
}

pub fn tasks_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks".to_string();
    }

    let rows = tasks.iter().enumerate().map(|(index, task)| row(index, task));
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

pub fn tasks_json(tasks: &[Task]) -> Result<String, AppError> {
    serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn task_json(task: &Task) -> Result<String, AppError> {
    serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))
}
