//! Error types and Result aliases for docwatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using docwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Interlink synchronization error.
    #[error("interlinks error: {0}")]
    Interlinks(#[from] InterlinksError),

    /// Documentation pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config '{path}': {reason}")]
    Read { path: PathBuf, reason: String },

    /// Config file is not valid YAML or has the wrong shape.
    #[error("failed to parse config '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A config value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The watch root does not exist or is not readable.
    #[error("watch path not found: '{0}'")]
    PathNotFound(PathBuf),

    /// The underlying notification subscription failed.
    #[error("failed to watch '{path}': {reason}")]
    Subscribe { path: PathBuf, reason: String },
}

/// Interlink synchronization errors.
#[derive(Error, Debug)]
pub enum InterlinksError {
    /// The config has no `interlinks` block. Not a failure: the feature
    /// is simply not enabled for this project.
    #[error("no interlinks field found in config")]
    ConfigMissing,

    /// Network failure while fetching a remote inventory.
    #[error("failed to fetch inventory from '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The fetched payload is not a valid inventory.
    #[error("invalid inventory from '{url}': {reason}")]
    Invalid { url: String, reason: String },

    /// The converted cache file could not be written.
    #[error("failed to write cache file '{path}': {reason}")]
    WriteCache { path: PathBuf, reason: String },
}

/// Documentation pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pipeline command could not be spawned.
    #[error("failed to run '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// The pipeline command ran but exited non-zero.
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
