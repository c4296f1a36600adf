//! Configuration module for rowbind.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, LogFormat, LogSettings, QuerySettings, Settings,
    SettingsError,
};
