use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;
use todolist_core::TaskId;
use todolist_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "todolist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show all tasks in display order
    ///
    /// Example: todolist list
    List,
    /// Add a new task
    ///
    /// Example: todolist add "Buy milk"
    /// Example: todolist add "File taxes" --due 2026-04-15
    Add {
        title: Option<String>,
        /// Store the task as already completed
        #[arg(long)]
        done: bool,
        /// Due date
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_due_date)]
        due: Option<Date>,
    },
    /// Flip a task between open and completed
    ///
    /// Example: todolist toggle 0
    Toggle { task: TaskRef },
    /// Delete tasks by list position
    ///
    /// Example: todolist delete 1
    /// Example: todolist delete 0 2
    Delete {
        #[arg(required = true, value_name = "INDEX")]
        indices: Vec<usize>,
    },
    /// Change a task's title and due date
    ///
    /// Example: todolist edit 0 "Buy oat milk"
    /// Example: todolist edit 0 "Buy oat milk" --clear-due
    Edit {
        task: TaskRef,
        new_title: String,
        /// New due date; the current one is kept unless given or cleared
        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            value_parser = parse_due_date,
            conflicts_with = "clear_due"
        )]
        due: Option<Date>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
}

/// A task named on the command line, either by list position or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRef {
    Index(usize),
    Id(TaskId),
}

impl FromStr for TaskRef {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Ok(Self::Index(index));
        }
        trimmed
            .parse::<TaskId>()
            .map(Self::Id)
            .map_err(|_| format!("'{trimmed}' is neither a list index nor a task id"))
    }
}

pub fn parse_due_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD form", raw.trim()))
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    SortOnLoad(bool),
    StorePath(PathBuf),
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ConfigOverrideTarget, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    match field.as_str() {
        "sort_on_load" => parse_flag_value(value)
            .map(ConfigOverrideTarget::SortOnLoad)
            .ok_or_else(|| format!("sort_on_load expects true or false, got '{value}'")),
        "store_path" => {
            if value.is_empty() {
                Err("store_path override cannot be empty".to_string())
            } else {
                Ok(ConfigOverrideTarget::StorePath(PathBuf::from(value)))
            }
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Folds every `KEY=VALUE` string into one set of overrides. Later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        match parse_config_override(entry)? {
            ConfigOverrideTarget::SortOnLoad(value) => overrides.sort_on_load = Some(value),
            ConfigOverrideTarget::StorePath(path) => overrides.store_path = Some(path),
        }
    }
    Ok(overrides)
}

fn parse_flag_value(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
