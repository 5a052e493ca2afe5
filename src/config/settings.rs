// src/config/settings.rs
//! TOML-based configuration for scry.
//!
//! Example configuration:
//! ```toml
//! [executor]
//! attempts = 3
//! base_delay_secs = 1
//! max_delay_secs = 10
//!
//! [breaker]
//! failure_threshold = 5
//! recovery_timeout_secs = 60
//!
//! [access]
//! default_role = "${SCRY_DEFAULT_ROLE}"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exec::{BreakerConfig, RetryPolicy};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrySettings {
    pub executor: ExecutorSettings,
    pub breaker: BreakerSettings,
    pub access: AccessSettings,
}

/// Retry behaviour of the executor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Total attempts per execution, the first call included.
    pub attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_secs: 1,
            max_delay_secs: 10,
        }
    }
}

impl ExecutorSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_secs(self.base_delay_secs),
            Duration::from_secs(self.max_delay_secs),
        )
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 60,
        }
    }
}

impl BreakerSettings {
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: Duration::from_secs(self.recovery_timeout_secs),
        }
    }
}

/// Access defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Role assumed when a request names none. Unknown names still parse
    /// fail-secure downstream.
    pub default_role: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            default_role: "guest".to_string(),
        }
    }
}

impl ScrySettings {
    /// Load settings from a TOML file, expanding `${VAR}` references.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let content = expand_env_vars(&content)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCRY_CONFIG`
    /// 2. `./scry.toml`
    /// 3. `~/.config/scry/config.toml`
    ///
    /// A missing file anywhere in the chain falls through; only an
    /// unreadable or malformed file is an error.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCRY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::from_file(path);
            }
            debug!(path = %path.display(), "SCRY_CONFIG file missing, continuing the chain");
        }

        let local_config = PathBuf::from("scry.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scry").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(ScrySettings::default())
    }
}

/// Expand `${VAR}` references from the environment. A `$` not followed by
/// `{` passes through untouched.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                // Unterminated reference, keep the literal text.
                result.push_str("${");
                result.push_str(&var_name);
                continue;
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
