// src/error.rs

//! Error types for the cooker

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Cooker errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid content path '{path}': {reason}")]
    InvalidContentPath { path: String, reason: String },

    #[error("Content environment check failed: {0}")]
    Environment(String),

    #[error("Failed to acquire cooker lock at {path:?}: {reason}")]
    Lock { path: PathBuf, reason: String },

    #[error("Failed to cook '{file}': {reason}")]
    CookFailed { file: String, reason: String },

    #[error("{task}: {failed} of {total} file(s) failed to cook")]
    BatchFailed {
        task: String,
        failed: usize,
        total: usize,
    },

    #[error("Process '{command}' failed: {reason}")]
    Process { command: String, reason: String },

    #[error("Source control error: {0}")]
    SourceControl(String),

    #[error("No cook task can cook '{0}'")]
    NoTaskForFile(String),

    #[error("Ambiguous cook tasks for '{file}': {tasks:?}")]
    AmbiguousTask { file: String, tasks: Vec<String> },

    #[error("Operation not supported by {task}: {operation}")]
    Unsupported {
        task: String,
        operation: &'static str,
    },

    #[error("Failed to update cook metadata for '{file}': {reason}")]
    Metadata { file: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a per-file cook failure
    pub fn cook_failed(file: impl ToString, reason: impl Into<String>) -> Self {
        Self::CookFailed {
            file: file.to_string(),
            reason: reason.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(e.to_string())
    }
}
