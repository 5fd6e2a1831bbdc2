use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::{EngineSettings, PhantomEngine};
use crate::options::{EngineOptions, RenderOptions};

const CONFIG_DIR: &str = "phantom-render";
const CONFIG_FILE: &str = "config.toml";

/// File-backed defaults for the engine, its switches and renders.
///
/// Every section is optional; missing keys fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub switches: EngineOptions,
    pub render: RenderOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

impl Config {
    /// Loads configuration.
    ///
    /// Priority: explicit path > central config file > defaults. An explicit
    /// path must exist; a missing central file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::central_config_path() {
                Some(central) if central.is_file() => Self::from_file(&central),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$XDG_CONFIG_HOME/phantom-render/config.toml`, else `~/.config/phantom-render/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|value| !value.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.executable.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "engine.executable must not be empty".to_string(),
            ));
        }
        if engine.max_concurrent_processes == 0 {
            return Err(ConfigError::Invalid(
                "engine.max-concurrent-processes must be at least 1".to_string(),
            ));
        }
        if engine.render_grace.is_zero() {
            return Err(ConfigError::Invalid(
                "engine.render-grace must be positive".to_string(),
            ));
        }
        if engine.probe_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "engine.probe-timeout must be positive".to_string(),
            ));
        }
        if engine.exec_timeout.is_some_and(|limit| limit.is_zero()) {
            return Err(ConfigError::Invalid(
                "engine.exec-timeout must be positive when set".to_string(),
            ));
        }
        if self.switches.help || self.switches.version {
            return Err(ConfigError::Invalid(
                "switches.help and switches.version are per-invocation flags".to_string(),
            ));
        }
        self.render
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("render: {e}")))
    }

    /// Builds an engine from the `[engine]` and `[switches]` sections.
    pub fn engine(&self) -> PhantomEngine {
        PhantomEngine::new(self.engine.clone()).with_switches(self.switches.clone())
    }
}
