use clap::{CommandFactory, Parser};
use std::collections::BTreeSet;
use std::io::{self, BufRead};
use todolist_cli::cli::{CONFIG_OVERRIDE_FLAG, Cli, Command, TaskRef, collect_config_overrides};
use todolist_cli::render;
use todolist_core::config::{self, Config};
use todolist_core::{AppError, TaskId, TaskStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TODOLIST_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn report(err: &AppError) {
    eprintln!("ERROR: {} - {}", err.code(), err);
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        warn!(error = %err, "ignoring unreadable config, using defaults");
    }

    let overrides = collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn resolve_task(store: &TaskStore, task: TaskRef) -> Result<TaskId, AppError> {
    match task {
        TaskRef::Id(id) => Ok(id),
        TaskRef::Index(index) => store
            .list()
            .get(index)
            .map(|task| task.id)
            .ok_or(AppError::IndexOutOfRange {
                index,
                len: store.len(),
            }),
    }
}

fn run_command(store: &mut TaskStore, command: Command, json: bool) -> Result<(), AppError> {
    match command {
        Command::List => {
            if json {
                println!("{}", render::tasks_json(store.list())?);
            } else {
                println!("{}", render::tasks_table(store.list()));
            }
        }
        Command::Add { title, done, due } => {
            let title = title.unwrap_or_default();
            let task = store.add_with_details(&title, done, due)?;
            if json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Toggle { task } => {
            let id = resolve_task(store, task)?;
            let task = store.toggle_completion(id)?;
            if json {
                println!("{}", render::task_json(&task)?);
            } else if task.is_completed {
                println!("Completed task: {} ({})", task.title, task.id);
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { indices } => {
            let indices: BTreeSet<usize> = indices.into_iter().collect();
            let removed = store.delete(&indices)?;
            if json {
                println!("{}", render::tasks_json(&removed)?);
            } else {
                for task in &removed {
                    println!("Deleted task: {} ({})", task.title, task.id);
                }
            }
        }
        Command::Edit {
            task,
            new_title,
            due,
            clear_due,
        } => {
            let id = resolve_task(store, task)?;
            let due_date = if clear_due {
                None
            } else if due.is_some() {
                due
            } else {
                store
                    .get(id)
                    .ok_or(AppError::NotFound(id))?
                    .due_date
            };
            let task = store.update(id, &new_title, due_date)?;
            if json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
    }

    Ok(())
}

fn run_interactive(store: &mut TaskStore) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                report(&err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        if args.iter().any(|arg| arg.starts_with(CONFIG_OVERRIDE_FLAG)) {
            report(&AppError::invalid_input(
                "config overrides only apply when starting todolist",
            ));
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todolist".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                report(&normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(store, cli.command, cli.json) {
            report(&err);
        }
    }

    Ok(())
}

fn open_store(raw_overrides: &[String]) -> Result<TaskStore, AppError> {
    let config = load_config(raw_overrides)?;
    TaskStore::open_with_config(&config)
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let result = open_store(&[]).and_then(|mut store| run_interactive(&mut store));
        if let Err(err) = result {
            report(&err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => {
            report(&normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let result = open_store(&cli.config_override)
        .and_then(|mut store| run_command(&mut store, cli.command, cli.json));
    if let Err(err) = result {
        report(&err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::split_command_line;

    #[test]
    fn split_command_line_honors_quotes() {
        let args = split_command_line(r#"add "Buy oat milk" --due 2026-01-02"#).unwrap();
        assert_eq!(args, vec!["add", "Buy oat milk", "--due", "2026-01-02"]);
    }

    #[test]
    fn split_command_line_unescapes_inner_quotes() {
        let args = split_command_line(r#"add "Read \"Dune\"""#).unwrap();
        assert_eq!(args, vec!["add", r#"Read "Dune""#]);
    }

    #[test]
    fn split_command_line_rejects_unterminated_quote() {
        let err = split_command_line(r#"add "Buy milk"#).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
