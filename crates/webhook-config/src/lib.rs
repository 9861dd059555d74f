//! Layered configuration resolution: command flag, then environment
//! variable, then TOML config file, then built-in default.

mod log_level;

pub use log_level::{InvalidLogLevel, LogLevel};

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use webhook_core::EnvLookup;

pub const ENV_CONFIG_PATH: &str = "BETTER_WEBHOOK_CONFIG";
pub const ENV_CAPTURES_DIR: &str = "BETTER_WEBHOOK_CAPTURES_DIR";
pub const ENV_TEMPLATES_DIR: &str = "BETTER_WEBHOOK_TEMPLATES_DIR";
pub const ENV_LOG_LEVEL: &str = "BETTER_WEBHOOK_LOG_LEVEL";

const RECOGNISED_KEYS: &[&str] = &["captures_dir", "templates_dir", "log_level"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} as TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported config key {0:?} in config file")]
    UnsupportedKey(String),
    #[error(transparent)]
    InvalidLogLevel(#[from] InvalidLogLevel),
    #[error("could not determine the home directory to expand {0:?}")]
    HomeDirUnavailable(String),
}

/// The resolved, validated application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub captures_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub log_level: LogLevel,
}

/// Explicit command-line flag values, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigFlags {
    pub config_path: Option<String>,
    pub captures_dir: Option<String>,
    pub templates_dir: Option<String>,
    pub log_level: Option<String>,
}

/// The subset of TOML keys the config file may set. Deserialisation
/// happens in two passes so unrecognised keys are rejected explicitly
/// rather than silently ignored by serde.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    captures_dir: Option<String>,
    templates_dir: Option<String>,
    log_level: Option<String>,
}

/// Resolves an [`AppConfig`] from `flags`, `env`, and the TOML file at
/// the computed config path, falling back to built-in defaults.
/// `home_dir` is injected so tests never depend on the real `$HOME`.
pub fn load(
    flags: &ConfigFlags,
    env: &dyn EnvLookup,
    home_dir: Option<&Path>,
) -> Result<AppConfig, ConfigError> {
    let config_path = resolve_config_path(flags, env, home_dir);
    let file = read_config_file(config_path.as_deref())?;

    let captures_dir = flags
        .captures_dir
        .clone()
        .or_else(|| env.get(ENV_CAPTURES_DIR))
        .or(file.captures_dir)
        .unwrap_or_else(|| "~/.better-webhook/captures".to_string());
    let templates_dir = flags
        .templates_dir
        .clone()
        .or_else(|| env.get(ENV_TEMPLATES_DIR))
        .or(file.templates_dir)
        .unwrap_or_else(|| "~/.better-webhook/templates".to_string());
    let log_level_raw = flags
        .log_level
        .clone()
        .or_else(|| env.get(ENV_LOG_LEVEL))
        .or(file.log_level)
        .unwrap_or_else(|| "info".to_string());

    Ok(AppConfig {
        captures_dir: expand_path(&captures_dir, home_dir)?,
        templates_dir: expand_path(&templates_dir, home_dir)?,
        log_level: log_level_raw.parse()?,
    })
}

/// Builds the default config file's contents for `init`.
#[must_use]
pub fn default_config_toml() -> String {
    "captures_dir = \"~/.better-webhook/captures\"\n\
     templates_dir = \"~/.better-webhook/templates\"\n\
     log_level = \"info\"\n"
        .to_string()
}

fn resolve_config_path(
    flags: &ConfigFlags,
    env: &dyn EnvLookup,
    home_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = &flags.config_path {
        return Some(PathBuf::from(path));
    }
    if let Some(path) = env.get(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    home_dir.map(|home| home.join(".better-webhook").join("config.toml"))
}

fn read_config_file(path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let table: toml::Value = text.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let toml::Value::Table(map) = &table {
        for key in map.keys() {
            if !RECOGNISED_KEYS.contains(&key.as_str()) {
                return Err(ConfigError::UnsupportedKey(key.clone()));
            }
        }
    }

    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn expand_path(raw: &str, home_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = home_dir.ok_or_else(|| ConfigError::HomeDirUnavailable(raw.to_string()))?;
        return Ok(home.join(rest));
    }
    if raw == "~" {
        let home = home_dir.ok_or_else(|| ConfigError::HomeDirUnavailable(raw.to_string()))?;
        return Ok(home.to_path_buf());
    }
    let expanded = shellexpand::env(raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.to_string());
    Ok(PathBuf::from(expanded))
}

/// Resolves the real home directory, for production callers (CLI
/// wiring). Tests pass an explicit `home_dir` to [`load`] instead.
#[must_use]
pub fn real_home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use webhook_core::MapEnv;

    #[test]
    fn precedence_is_flag_then_env_then_file_then_default() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        std::fs::create_dir_all(home.join(".better-webhook")).unwrap();
        std::fs::write(
            home.join(".better-webhook").join("config.toml"),
            "captures_dir = \"A\"\n",
        )
        .unwrap();

        let flags = ConfigFlags::default();
        let env = MapEnv::new().with("BETTER_WEBHOOK_CAPTURES_DIR", "B");
        let config = load(&flags, &env, Some(home)).unwrap();
        assert_eq!(config.captures_dir, PathBuf::from("B"));

        let env_empty = MapEnv::new();
        let config = load(&flags, &env_empty, Some(home)).unwrap();
        assert_eq!(config.captures_dir, PathBuf::from("A"));

        let flags_override = ConfigFlags {
            captures_dir: Some("C".to_string()),
            ..Default::default()
        };
        let config = load(&flags_override, &env, Some(home)).unwrap();
        assert_eq!(config.captures_dir, PathBuf::from("C"));
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let flags = ConfigFlags::default();
        let env = MapEnv::new();
        let config = load(&flags, &env, Some(dir.path())).unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn unsupported_config_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();
        std::fs::create_dir_all(home.join(".better-webhook")).unwrap();
        std::fs::write(
            home.join(".better-webhook").join("config.toml"),
            "nonsense_key = \"x\"\n",
        )
        .unwrap();

        let err = load(&ConfigFlags::default(), &MapEnv::new(), Some(home)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedKey(_)));
    }

    #[test]
    fn tilde_expands_against_injected_home() {
        let dir = tempfile::tempdir().unwrap();
        let flags = ConfigFlags {
            captures_dir: Some("~/mycaptures".to_string()),
            ..Default::default()
        };
        let config = load(&flags, &MapEnv::new(), Some(dir.path())).unwrap();
        assert_eq!(config.captures_dir, dir.path().join("mycaptures"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let flags = ConfigFlags {
            log_level: Some("verbose".to_string()),
            ..Default::default()
        };
        let err = load(&flags, &MapEnv::new(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }
}
