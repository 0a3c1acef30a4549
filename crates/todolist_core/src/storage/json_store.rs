use crate::config::{APP_DIR_NAME, Config};
use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TODOLIST_STORE_PATH";

pub fn store_path(config: &Config) -> Result<PathBuf, AppError> {
    let env_path = std::env::var(STORE_ENV_VAR).ok();
    resolve_store_path(env_path.as_deref(), config)
}

fn resolve_store_path(env_path: Option<&str>, config: &Config) -> Result<PathBuf, AppError> {
    if let Some(path) = env_path
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = config.store_path.as_ref() {
        return Ok(path.clone());
    }

    let base = dirs::config_dir()
        .ok_or_else(|| AppError::invalid_data("no configuration directory available"))?;
    Ok(base.join(APP_DIR_NAME).join(STORE_FILE_NAME))
}

/// Reads the task array at `path`. A missing file is an empty list.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let tasks: Vec<Task> =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if task.title.trim().is_empty() {
            return Err(AppError::invalid_data(format!(
                "task {} has an empty title",
                task.id
            )));
        }
        if !seen.insert(task.id) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }

    Ok(tasks)
}

/// Writes a sibling temporary file and renames it over `path`.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;

    let content =
        serde_json::to_string_pretty(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut file =
        tempfile::NamedTempFile::new_in(parent).map_err(|err| AppError::io(err.to_string()))?;
    file.write_all(content.as_bytes())
        .map_err(|err| AppError::io(err.to_string()))?;
    file.as_file()
        .sync_all()
        .map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        file.as_file()
            .set_permissions(permissions)
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    file.persist(path)
        .map_err(|err| AppError::io(err.error.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_tasks, resolve_store_path, save_tasks};
    use crate::config::Config;
    use crate::model::Task;
    use std::fs;
    use std::path::PathBuf;
    use time::macros::date;

    #[test]
    fn store_path_prefers_env_then_config() {
        let config = Config {
            sort_on_load: true,
            store_path: Some(PathBuf::from("/data/configured.json")),
        };

        assert_eq!(
            resolve_store_path(Some("/env/tasks.json"), &config).unwrap(),
            PathBuf::from("/env/tasks.json")
        );
        assert_eq!(
            resolve_store_path(None, &config).unwrap(),
            PathBuf::from("/data/configured.json")
        );
        assert_eq!(
            resolve_store_path(Some("   "), &config).unwrap(),
            PathBuf::from("/data/configured.json")
        );
    }

    #[test]
    fn store_path_defaults_to_app_directory() {
        if let Ok(path) = resolve_store_path(None, &Config::default()) {
            assert!(path.ends_with("todolist/tasks.json"));
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let tasks = vec![
            Task::new("Buy milk"),
            Task::new("Walk the dog")
                .with_completed(true)
                .with_due_date(Some(date!(2025 - 05 - 03))),
        ];

        save_tasks(&path, &tasks).unwrap();
        let loaded = load_tasks(&path).unwrap();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn writes_a_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let task = Task::new("demo").with_due_date(Some(date!(2025 - 12 - 21)));

        save_tasks(&path, std::slice::from_ref(&task)).unwrap();
        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        let array = stored.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["id"], task.id.to_string());
        assert_eq!(array[0]["title"], "demo");
        assert_eq!(array[0]["isCompleted"], false);
        assert_eq!(array[0]["dueDate"], "2025-12-21");
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("tasks.json");

        save_tasks(&path, &[Task::new("demo")]).unwrap();

        assert_eq!(load_tasks(&path).unwrap().len(), 1);
    }

    #[test]
    fn save_leaves_no_temporary_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        save_tasks(&path, &[Task::new("a")]).unwrap();
        save_tasks(&path, &[Task::new("b")]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        save_tasks(&path, &[Task::new("demo")]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_tasks(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn rejects_non_json_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, "this is not json {").unwrap();

        let err = load_tasks(&path).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_non_boolean_completion_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-flag.json");
        let content = r#"[
            {
                "id": "2f1c6d2e-7d55-4f0a-9a57-0b1e6f4f2f10",
                "title": "demo",
                "isCompleted": "yes"
            }
        ]"#;
        fs::write(&path, content).unwrap();

        assert_eq!(load_tasks(&path).unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn rejects_object_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envelope.json");
        fs::write(&path, r#"{ "tasks": [] }"#).unwrap();

        assert_eq!(load_tasks(&path).unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup-ids.json");
        let content = r#"[
            { "id": "2f1c6d2e-7d55-4f0a-9a57-0b1e6f4f2f10", "title": "a", "isCompleted": false },
            { "id": "2f1c6d2e-7d55-4f0a-9a57-0b1e6f4f2f10", "title": "b", "isCompleted": true }
        ]"#;
        fs::write(&path, content).unwrap();

        let err = load_tasks(&path).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
        assert!(err.to_string().contains("duplicate task id"));
    }

    #[test]
    fn rejects_blank_titles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank-title.json");
        let content = r#"[
            { "id": "2f1c6d2e-7d55-4f0a-9a57-0b1e6f4f2f10", "title": "   ", "isCompleted": false }
        ]"#;
        fs::write(&path, content).unwrap();

        assert_eq!(load_tasks(&path).unwrap_err().code(), "invalid_data");
    }
}
