// src/scc/mod.rs

//! Source-control collaborator
//!
//! Tasks open cooked and generated files through this trait before writing
//! them. [`NullClient`] is used for local cooks; [`PerforceClient`] drives the
//! `p4` command line.

mod perforce;

pub use perforce::{PerforceClient, PerforceParams};

use crate::error::Result;
use std::fmt;
use std::path::PathBuf;

/// Base storage type of a file in the depot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFileType {
    Binary,
    Text,
}

/// Number of revisions the depot keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredRevisions {
    All,
    Four,
    OneTwentyEight,
}

/// Depot file type for files the cooker opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeOptions {
    pub base: BaseFileType,
    pub always_writeable: bool,
    pub exclusive_open: bool,
    pub preserve_modification_time: bool,
    pub revisions: StoredRevisions,
}

impl FileTypeOptions {
    /// Cooked binaries: exclusive, writeable, mtime preserved
    pub const fn cooked(long_life: bool) -> Self {
        Self {
            base: BaseFileType::Binary,
            always_writeable: true,
            exclusive_open: true,
            preserve_modification_time: true,
            revisions: if long_life {
                StoredRevisions::OneTwentyEight
            } else {
                StoredRevisions::Four
            },
        }
    }

    /// Files generated into `Source/Generated*`
    pub const fn generated(long_life: bool) -> Self {
        Self {
            base: BaseFileType::Text,
            always_writeable: true,
            exclusive_open: false,
            preserve_modification_time: true,
            revisions: if long_life {
                StoredRevisions::OneTwentyEight
            } else {
                StoredRevisions::Four
            },
        }
    }
}

impl fmt::Display for FileTypeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseFileType::Binary => "binary",
            BaseFileType::Text => "text",
        };
        let mut modifiers = String::new();
        if self.always_writeable {
            modifiers.push('w');
        }
        if self.exclusive_open {
            modifiers.push('l');
        }
        if self.preserve_modification_time {
            modifiers.push('m');
        }
        match self.revisions {
            StoredRevisions::All => {}
            StoredRevisions::Four => modifiers.push_str("S4"),
            StoredRevisions::OneTwentyEight => modifiers.push_str("S128"),
        }

        if modifiers.is_empty() {
            write!(f, "{}", base)
        } else {
            write!(f, "{}+{}", base, modifiers)
        }
    }
}

/// Source-control operations used while cooking
///
/// Paths are absolute. A partial failure is reported as an error naming
/// the files that failed.
pub trait SourceControl: Send + Sync {
    /// True for the no-op client
    fn is_null(&self) -> bool {
        false
    }

    fn open_for_edit(&self, files: &[PathBuf], options: &FileTypeOptions) -> Result<()>;

    fn open_for_add(&self, files: &[PathBuf], options: &FileTypeOptions) -> Result<()>;

    fn open_for_delete(&self, files: &[PathBuf]) -> Result<()>;

    fn revert_unchanged(&self, files: &[PathBuf]) -> Result<()>;

    /// Sync paths (files or `dir/...` specs) to head
    fn sync(&self, specs: &[String]) -> Result<()>;
}

/// Client that does nothing, for local cooks
#[derive(Debug, Default, Clone, Copy)]
pub struct NullClient;

impl SourceControl for NullClient {
    fn is_null(&self) -> bool {
        true
    }

    fn open_for_edit(&self, _files: &[PathBuf], _options: &FileTypeOptions) -> Result<()> {
        Ok(())
    }

    fn open_for_add(&self, _files: &[PathBuf], _options: &FileTypeOptions) -> Result<()> {
        Ok(())
    }

    fn open_for_delete(&self, _files: &[PathBuf]) -> Result<()> {
        Ok(())
    }

    fn revert_unchanged(&self, _files: &[PathBuf]) -> Result<()> {
        Ok(())
    }

    fn sync(&self, _specs: &[String]) -> Result<()> {
        Ok(())
    }
}
