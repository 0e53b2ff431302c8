use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "riti";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "RITI_CONFIG_PATH";

pub const DEFAULT_REWARD: u32 = 10;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store_path: Option<String>,
    #[serde(default)]
    pub default_reward: Option<u32>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Config {
    pub fn reward_or_default(&self) -> u32 {
        self.default_reward.unwrap_or(DEFAULT_REWARD)
    }

    pub fn log_filter_or_default(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub store_path: Option<String>,
    pub default_reward: Option<u32>,
    pub log_filter: Option<String>,
}

/// Per-user application directory holding the config and task files.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config(config))
}

fn normalize_config(mut config: Config) -> Config {
    config.store_path = non_blank(config.store_path);
    config.log_filter = non_blank(config.log_filter);
    config
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(store_path) = non_blank(overrides.store_path.clone()) {
        merged.store_path = Some(store_path);
    }
    if let Some(reward) = overrides.default_reward {
        merged.default_reward = Some(reward);
    }
    if let Some(filter) = non_blank(overrides.log_filter.clone()) {
        merged.log_filter = Some(filter);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, DEFAULT_LOG_FILTER, DEFAULT_REWARD, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides,
    };
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("riti-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
        assert_eq!(result.config.reward_or_default(), DEFAULT_REWARD);
        assert_eq!(result.config.log_filter_or_default(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "store_path": "/tmp/riti/tasks.json",
            "default_reward": 25,
            "log_filter": "riti_core=debug"
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.store_path.as_deref(), Some("/tmp/riti/tasks.json"));
        assert_eq!(loaded.reward_or_default(), 25);
        assert_eq!(loaded.log_filter_or_default(), "riti_core=debug");
    }

    #[test]
    fn load_config_treats_blank_strings_as_unset() {
        let path = temp_path("blank-config.json");
        fs::write(&path, r#"{ "store_path": "  ", "log_filter": "" }"#).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn merge_overrides_replaces_given_fields_only() {
        let base = Config {
            store_path: Some("/data/tasks.json".into()),
            default_reward: Some(20),
            log_filter: Some("info".into()),
        };
        let overrides = ConfigOverrides {
            store_path: None,
            default_reward: Some(50),
            log_filter: Some("debug".into()),
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.store_path.as_deref(), Some("/data/tasks.json"));
        assert_eq!(merged.default_reward, Some(50));
        assert_eq!(merged.log_filter.as_deref(), Some("debug"));
        assert_eq!(base.default_reward, Some(20));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            store_path: Some("/data/tasks.json".into()),
            default_reward: None,
            log_filter: None,
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }
}
