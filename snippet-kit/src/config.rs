// Configuration loading and parsing (snippet.toml).

use reqwest::header::HeaderValue;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::processor::ProcessorConfig;

/// File name of the single config file, under both `config/` and `defaults/`.
pub const CONFIG_FILE_NAME: &str = "snippet.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// snippet.toml structs
// ---------------------------------------------------------------------------

/// Top-level configuration. Every section and key is optional in the file;
/// missing entries take the values from `Default`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub processor: ProcessorConfig,
}

/// Settings for the HTTP fetcher.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Treat non-2xx responses as errors instead of decoding their body.
    pub fail_on_error_status: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("snippet-kit/", env!("CARGO_PKG_VERSION")).to_string(),
            fail_on_error_status: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/snippet.toml` relative to `base_dir`.
///
/// This does not copy defaults. Prefer `load_config()` (or call
/// `ensure_config_file` first) when running from a project checkout.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|source| ConfigError::ParseError {
        path: path.clone(),
        source,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Parse config text without touching the filesystem. Validation is left to
/// the caller.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy `defaults/snippet.toml` to `config/snippet.toml` when the latter is
/// missing. Returns the path written, or `None` when nothing was copied
/// (no shipped default, or the user already has a config file).
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE_NAME);
    if !source.is_file() {
        return Ok(None);
    }

    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    // create_new so an existing user config is never overwritten.
    let target = config_dir.join(CONFIG_FILE_NAME);
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            });
        }
    };

    let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", source.display()),
    })?;
    std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;

    Ok(Some(target))
}

/// Load config relative to `base_dir`, copying defaults first.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    load_config_in(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Only a missing file maps to `FileNotFound`; callers treat that as "no
/// config". Anything else (permissions, invalid UTF-8) is `Io`.
fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "http.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "http.user_agent".into(),
            message: "must not be empty".into(),
        });
    }

    if HeaderValue::from_str(&config.http.user_agent).is_err() {
        return Err(ConfigError::ValidationError {
            field: "http.user_agent".into(),
            message: "must be a valid HTTP header value".into(),
        });
    }

    if config.processor.field.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "processor.field".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
