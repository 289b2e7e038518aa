//! Error types for hotplug reconfiguration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetconfError {
    #[error("Command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Proxy config {path}: {source}")]
    ProxyConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, NetconfError>;
