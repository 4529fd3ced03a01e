// src/database/mod.rs

//! Dependency database: decides whether a cooked file is stale
//!
//! One-to-one types compare the cooked file's modification time against its
//! source. Many-to-one types (UI movies) keep a metadata row listing every
//! dependency and the timestamp or file count observed when they were cooked.

mod schema;
mod sqlite;
pub mod timestamp;

pub use sqlite::SqliteCookDatabase;

use crate::content::{FilePath, FileType};
use crate::error::Result;
use strum_macros::{AsRefStr, EnumString};

/// Version of the cooker itself; bumping it recooks every many-to-one file
pub const COOKER_VERSION: u32 = 39;

/// Per-type data version; bumping one recooks every file of that type
pub fn data_version(file_type: FileType) -> u32 {
    match file_type {
        FileType::Font => 7,
        FileType::SceneAsset => 2,
        FileType::Script => 7,
        FileType::Texture0
        | FileType::Texture1
        | FileType::Texture2
        | FileType::Texture3
        | FileType::Texture4 => 3,
        FileType::UiMovie => 9,
        _ => 1,
    }
}

/// How a dependency is located and compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    /// A file in the source tree, compared by timestamp
    Source,
    /// A cooked file next to the output, compared by timestamp
    Sibling,
    /// A source directory, compared by file count
    Directory,
}

/// One dependency of a cooked file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookSource {
    /// `/`-separated path relative to the source root, or to the platform
    /// content root for siblings
    pub relative: String,
    pub kind: SourceKind,
}

impl CookSource {
    pub fn source(path: &FilePath) -> Self {
        Self {
            relative: path.relative_source(),
            kind: SourceKind::Source,
        }
    }

    pub fn sibling(path: &FilePath) -> Self {
        Self {
            relative: path.relative_cooked(),
            kind: SourceKind::Sibling,
        }
    }

    pub fn directory(relative: impl Into<String>) -> Self {
        Self {
            relative: relative.into(),
            kind: SourceKind::Directory,
        }
    }
}

/// Result of a detailed staleness query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    UpToDate,
    /// `changed` lists the dependencies that moved. Empty means a global
    /// reason (version mismatch, missing output) and every dependency
    /// should be treated as changed.
    Stale { changed: Vec<String> },
}

impl Freshness {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Freshness::UpToDate)
    }
}

/// Staleness oracle consulted by every cook task
///
/// Shared by reference with worker threads during a parallel batch.
pub trait CookDatabase: Send + Sync {
    /// True if the cooked output of `path` is current
    fn check_up_to_date(&self, path: &FilePath) -> Result<bool>;

    /// Like [`check_up_to_date`](Self::check_up_to_date), also reporting
    /// which dependencies changed
    fn check_up_to_date_with_details(&self, path: &FilePath) -> Result<Freshness>;

    /// Record fresh metadata after `path` was cooked
    fn update_metadata(&self, path: &FilePath, cooked_timestamp: u64, sources: &[CookSource]) -> Result<()>;

    /// Forget anything cached about `path`
    fn on_file_change(&self, path: &FilePath);
}
