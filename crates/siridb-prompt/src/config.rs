//! Prompt configuration: optional TOML file merged with command line values.

use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

pub const DEFAULT_HISTORY: u16 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u16 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const CONFIG_DIR_NAME: &str = ".siridb-prompt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server '{entry}': {reason}")]
    InvalidServer { entry: String, reason: &'static str },
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: SmolStr },
}

/// Values read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub history: Option<u16>,
    pub timeout_secs: Option<u16>,
    pub json: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<SmolStr>,
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub history: Option<u16>,
    pub timeout_secs: Option<u16>,
    pub json: bool,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<SmolStr>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub history: u16,
    pub timeout_secs: u16,
    pub json: bool,
    pub log_file: Option<PathBuf>,
    pub log_level: SmolStr,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Loads `path` when it exists.
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    fn parse(text: &str) -> Result<Self, SmolStr> {
        let raw: PromptToml = toml::from_str(text).map_err(|err| SmolStr::new(err.to_string()))?;
        raw.into_config()
    }

    pub fn merge(&self, overrides: Overrides) -> PromptConfig {
        PromptConfig {
            history: overrides
                .history
                .or(self.history)
                .unwrap_or(DEFAULT_HISTORY),
            timeout_secs: overrides
                .timeout_secs
                .or(self.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            json: overrides.json || self.json.unwrap_or(false),
            log_file: overrides.log_file.or_else(|| self.log_file.clone()),
            log_level: overrides
                .log_level
                .or_else(|| self.log_level.clone())
                .unwrap_or_else(|| SmolStr::new(DEFAULT_LOG_LEVEL)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptToml {
    #[serde(default)]
    console: ConsoleSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsoleSection {
    history: Option<u16>,
    timeout: Option<u16>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    file: Option<PathBuf>,
    level: Option<String>,
}

impl PromptToml {
    fn into_config(self) -> Result<FileConfig, SmolStr> {
        if self.console.timeout == Some(0) {
            return Err("console.timeout must be >= 1".into());
        }
        if let Some(level) = &self.log.level {
            if level.trim().is_empty() {
                return Err("log.level must not be empty".into());
            }
        }
        Ok(FileConfig {
            history: self.console.history,
            timeout_secs: self.console.timeout,
            json: self.console.json,
            log_file: self.log.file,
            log_level: self.log.level.map(|level| SmolStr::new(level.trim())),
        })
    }
}

/// `<home>/.siridb-prompt`, when a home directory is known.
pub fn config_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR_NAME))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// History file for one user and database.
pub fn history_path(user: &str, dbname: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(history_file_name(user, dbname)))
}

pub fn history_file_name(user: &str, dbname: &str) -> String {
    format!("{user}@{dbname}.history.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = FileConfig::default().merge(Overrides::default());
        assert_eq!(
            config,
            PromptConfig {
                history: 1000,
                timeout_secs: 60,
                json: false,
                log_file: None,
                log_level: SmolStr::new("info"),
            }
        );
    }

    #[test]
    fn flags_override_file_and_file_overrides_defaults() {
        let file = FileConfig::parse(
            r#"
[console]
history = 50
timeout = 5
json = true

[log]
file = "/tmp/prompt.log"
level = "debug"
"#,
        )
        .expect("parse config");
        let merged = file.merge(Overrides {
            timeout_secs: Some(9),
            log_level: Some(SmolStr::new("trace")),
            ..Overrides::default()
        });
        assert_eq!(merged.history, 50);
        assert_eq!(merged.timeout_secs, 9);
        assert!(merged.json);
        assert_eq!(merged.log_file, Some(PathBuf::from("/tmp/prompt.log")));
        assert_eq!(merged.log_level, "trace");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = FileConfig::parse("[console]\ntimeout = 0\n").expect_err("zero timeout");
        assert_eq!(err, "console.timeout must be >= 1");
        assert!(FileConfig::parse("[console]\ncolour = true\n").is_err());
        assert!(FileConfig::parse("[log]\nlevel = \" \"\n").is_err());
    }

    #[test]
    fn load_reports_path_and_optional_skips_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        assert!(FileConfig::load_optional(&path).expect("missing").is_none());
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Read { .. })
        ));

        std::fs::write(&path, "[console]\nhistory = \"many\"\n").expect("write");
        let err = FileConfig::load(&path).expect_err("bad type");
        assert!(err.to_string().contains("config.toml"));

        std::fs::write(&path, "[console]\nhistory = 0\n").expect("write");
        let loaded = FileConfig::load_optional(&path).expect("load").expect("present");
        assert_eq!(loaded.history, Some(0));
    }

    #[test]
    fn history_file_is_named_per_user_and_database() {
        assert_eq!(history_file_name("iris", "dbtest"), "iris@dbtest.history.1");
    }
}
