use super::{Persistence, TaskState};
use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
pub const STORE_ENV_VAR: &str = "RITI_STORE_PATH";
const STORE_FILE_NAME: &str = "tasks.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    #[serde(default)]
    balance: u64,
    tasks: Vec<Task>,
}

/// Task state kept as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonStore {
    fn load(&self) -> Result<Option<TaskState>, AppError> {
        load_state(&self.path)
    }

    fn save(&mut self, tasks: &[Task], balance: u64) -> Result<(), AppError> {
        save_state(&self.path, tasks, balance)
    }
}

/// Store location from `RITI_STORE_PATH`, then the configured path, then the
/// platform default.
pub fn store_path(configured: Option<&str>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(crate::config::app_dir()?.join(STORE_FILE_NAME))
}

pub fn load_state(path: &Path) -> Result<Option<TaskState>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    check_tasks(&stored.tasks)?;

    tracing::debug!(
        path = %path.display(),
        tasks = stored.tasks.len(),
        balance = stored.balance,
        "loaded task state"
    );

    Ok(Some(TaskState {
        tasks: stored.tasks,
        balance: stored.balance,
    }))
}

/// Writes the document next to `path` and renames it into place, so a failed
/// write never leaves a truncated store behind.
pub fn save_state(path: &Path, tasks: &[Task], balance: u64) -> Result<(), AppError> {
    check_tasks(tasks)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        balance,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let staging = staging_path(path);
    if let Err(err) = write_staged(&staging, path, &content) {
        std::fs::remove_file(&staging).ok();
        return Err(err);
    }

    tracing::debug!(path = %path.display(), tasks = tasks.len(), balance, "saved task state");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| STORE_FILE_NAME.to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_staged(staging: &Path, path: &Path, content: &str) -> Result<(), AppError> {
    std::fs::write(staging, content)
        .map_err(|err| AppError::io(format!("{}: {}", staging.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(staging, permissions)
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    std::fs::rename(staging, path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))
}

/// Shared by load and save: whatever a save accepts, a later load must accept.
fn check_tasks(tasks: &[Task]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if !task.completion_consistent() {
            return Err(AppError::invalid_data(format!(
                "task {} has inconsistent completion fields",
                task.id
            )));
        }
    }
    Ok(())
}
