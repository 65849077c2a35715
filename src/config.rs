use crate::ai_sql::config::AiSqlConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const HISTORY_FILE_NAME: &str = "history.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    Info,
    #[default]
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_console_output")]
    pub console_output: bool,
    #[serde(default = "default_file_output")]
    pub file_output: bool,
    /// Directory for daily-rotated log files
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::default(),
            console_output: default_console_output(),
            file_output: default_file_output(),
            log_dir: default_log_dir(),
            max_files: default_max_files(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the ride-sharing data
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_show_banner")]
    pub show_banner: bool,
    /// Lines kept in the line-editor history file
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ai: AiSqlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            show_banner: default_show_banner(),
            history_max_entries: default_history_max_entries(),
            logging: LoggingConfig::default(),
            ai: AiSqlConfig::default(),
        }
    }
}

fn default_database_path() -> String {
    "uber_data.db".to_string()
}

fn default_show_banner() -> bool {
    true
}

fn default_history_max_entries() -> usize {
    1000
}

fn default_console_output() -> bool {
    true
}

fn default_file_output() -> bool {
    false
}

fn default_log_dir() -> String {
    match Config::get_config_directory() {
        Ok(dir) => dir.join("logs").to_string_lossy().to_string(),
        Err(_) => "logs".to_string(),
    }
}

fn default_max_files() -> usize {
    5
}

impl Config {
    /// Configuration directory, or a per-process temp directory under tests
    pub fn get_config_directory() -> Result<PathBuf, Box<dyn Error>> {
        let is_test = std::env::var("NAVIGATOR_TEST_MODE").is_ok()
            || std::thread::current()
                .name()
                .map(|name| name.contains("test"))
                .unwrap_or(false);

        if is_test {
            let test_dir =
                std::env::temp_dir().join(format!("navigator_test_{}", std::process::id()));
            fs::create_dir_all(&test_dir)?;
            return Ok(test_dir);
        }

        match dirs::config_dir() {
            Some(dir) => {
                let config_dir = dir.join("navigator");
                fs::create_dir_all(&config_dir)?;
                Ok(config_dir)
            }
            None => Err("Failed to get configuration directory".into()),
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        Self::get_config_directory()
            .ok()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    pub fn history_file_path() -> Option<PathBuf> {
        Self::get_config_directory()
            .ok()
            .map(|dir| dir.join(HISTORY_FILE_NAME))
    }

    /// Load the default config file, writing one with defaults on first run.
    ///
    /// A file that fails to parse is left untouched and defaults are used.
    pub fn load() -> Self {
        match Self::default_config_path() {
            Some(path) => Self::load_or_init(&path),
            None => {
                warn!("No configuration directory available, using defaults");
                Config::default()
            }
        }
    }

    /// Read `path`, creating it with defaults when absent and falling back
    /// to defaults when it cannot be parsed
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let config = Config::default();
            if let Err(e) = config.save_to(path) {
                warn!(path = %path.display(), error = %e, "Could not write default config");
            } else {
                debug!("[Config::load] Wrote default config to {}", path.display());
            }
            return config;
        }

        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                eprintln!(
                    "Warning: could not read {} ({}). Using default configuration.",
                    path.display(),
                    e
                );
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!("[Config::load_from] Loaded {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        match Self::default_config_path() {
            Some(path) => self.save_to(&path),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "Configuration directory not found",
            )
            .into()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string(self)?;
        fs::write(path, toml)?;
        Ok(())
    }

    /// Effective settings as (key, value) pairs for display; the API key is masked
    pub fn describe(&self) -> Vec<(String, String)> {
        let api_key = match self.ai.get_api_key() {
            Some(key) if key.chars().count() > 8 => {
                format!("{}…", key.chars().take(4).collect::<String>())
            }
            Some(_) => "set".to_string(),
            None => "not set".to_string(),
        };

        vec![
            ("database_path".into(), self.database_path.clone()),
            ("show_banner".into(), self.show_banner.to_string()),
            ("history_max_entries".into(), self.history_max_entries.to_string()),
            ("logging.level".into(), self.logging.level.to_string()),
            ("logging.console_output".into(), self.logging.console_output.to_string()),
            ("logging.file_output".into(), self.logging.file_output.to_string()),
            ("logging.log_dir".into(), self.logging.log_dir.clone()),
            ("ai.base_url".into(), self.ai.base_url.clone()),
            ("ai.model".into(), self.ai.model.clone()),
            ("ai.api_key".into(), api_key),
            ("ai.timeout_seconds".into(), self.ai.timeout_seconds.to_string()),
            (
                "ai.sql_sampling".into(),
                format!("temperature {} / max {} tokens", self.ai.sql_temperature, self.ai.sql_max_tokens),
            ),
            (
                "ai.answer_sampling".into(),
                format!(
                    "temperature {} / max {} tokens",
                    self.ai.answer_temperature, self.ai.answer_max_tokens
                ),
            ),
        ]
    }
}
