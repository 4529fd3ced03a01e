// src/cook/atomic.rs

//! All-or-nothing writes of cooked output
//!
//! Output is staged in a temporary file in the destination directory and
//! renamed over the destination in one step, so a reader never sees a
//! truncated file. Staging in the same directory keeps the rename on one
//! file system.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Staged output for one destination
///
/// Dropping without [`commit`](Self::commit) removes the staged file and
/// leaves the destination untouched.
pub struct AtomicOutput {
    staged: NamedTempFile,
    destination: PathBuf,
}

impl AtomicOutput {
    pub fn create(destination: &Path) -> Result<Self> {
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| write_error(destination, "create output directory", e))?;
        let staged = tempfile::Builder::new()
            .prefix(".cook-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| write_error(destination, "create staging file", e))?;
        Ok(Self {
            staged,
            destination: destination.to_path_buf(),
        })
    }

    /// Path of the staging file, for converters that write it themselves
    pub fn staged_path(&self) -> &Path {
        self.staged.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn file(&mut self) -> &mut File {
        self.staged.as_file_mut()
    }

    /// Flush the staged bytes and move them over the destination
    pub fn commit(self) -> Result<()> {
        let destination = self.destination;
        self.staged
            .as_file()
            .sync_all()
            .map_err(|e| write_error(&destination, "sync staged output", e))?;
        self.staged
            .persist(&destination)
            .map_err(|e| write_error(&destination, "replace destination", e.error))?;
        debug!("Wrote {}", destination.display());
        Ok(())
    }
}

/// Stage output through `write`, committing only if it succeeds
pub fn atomic_write_with<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut output = AtomicOutput::create(destination)?;
    write(output.file())?;
    output.commit()
}

/// Write `data` to `destination` atomically
pub fn atomic_write_final_output(destination: &Path, data: &[u8]) -> Result<()> {
    atomic_write_with(destination, |file| {
        file.write_all(data)
            .map_err(|e| write_error(destination, "write staged output", e))
    })
}

/// Move a finished file (e.g. a converter's scratch output) to `destination`
///
/// The file is copied into a staging file next to the destination first,
/// since the scratch location may be on another file system.
pub fn atomic_move_final_output(finished: &Path, destination: &Path) -> Result<()> {
    atomic_write_with(destination, |file| {
        let mut source = File::open(finished).map_err(|e| write_error(destination, "open finished output", e))?;
        io::copy(&mut source, file).map_err(|e| write_error(destination, "copy finished output", e))?;
        Ok(())
    })?;
    if let Err(e) = fs::remove_file(finished) {
        warn!("Failed removing finished output {}: {}", finished.display(), e);
    }
    Ok(())
}

fn write_error(destination: &Path, step: &str, e: io::Error) -> Error {
    Error::cook_failed(destination.display(), format!("atomic write failed to {}: {}", step, e))
}
