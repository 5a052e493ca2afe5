// src/config/mod.rs
//! Runtime configuration.
//!
//! Resilience and access settings load from a TOML file with environment
//! variable expansion; everything has a built-in default.

mod settings;

pub use settings::{
    expand_env_vars, AccessSettings, BreakerSettings, ExecutorSettings, ScrySettings,
    SettingsError,
};
