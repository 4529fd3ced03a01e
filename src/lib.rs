// src/lib.rs

//! Incremental content cooker
//!
//! Turns authored game assets (fonts, scripts, UI movies, scene assets,
//! textures) into runtime formats, skipping anything whose cooked output is
//! already current.
//!
//! # Architecture
//!
//! - Tasks: one [`CookTask`] per kind of conversion, run as ordered stages
//! - Incremental: a SQLite [`database`] decides what is stale
//! - Parallel: independent files of a stage cook on a scoped worker pool
//! - Atomic output: cooked files are staged and renamed into place

pub mod config;
pub mod content;
pub mod cook;
pub mod database;
mod error;
pub mod progress;
pub mod scc;
pub mod tasks;

pub use config::{CookerConfig, CookerSettings, PackageConfig};
pub use content::{ContentPaths, FilePath, FileType, Platform, SourceFiles};
pub use cook::{CookContext, CookTask, Cooker, CookerBuilder};
pub use database::{CookDatabase, CookSource, Freshness, SqliteCookDatabase};
pub use error::{Error, Result};
pub use progress::{CallbackProgress, CliProgress, CookProgress, LogProgress, ProgressEvent, SilentProgress};
pub use scc::{NullClient, PerforceClient, PerforceParams, SourceControl};
