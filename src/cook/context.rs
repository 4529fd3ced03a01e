// src/cook/context.rs

//! Per-run facade handed to every task call

use crate::config::PackageConfig;
use crate::content::{ContentPaths, FilePath, FileType, Platform};
use crate::database::CookDatabase;
use crate::error::Result;
use crate::progress::CookProgress;
use crate::scc::{FileTypeOptions, SourceControl};
use std::path::Path;
use std::time::Duration;

/// Everything a task can reach during a cook
///
/// Read-only methods take `&self` and are safe to call from worker threads.
/// Methods that change the run's working set of source files take
/// `&mut self`: tasks only receive `&mut dyn CookContext` in
/// [`CookTask::cook_all_out_of_date`](super::CookTask::cook_all_out_of_date)
/// and [`CookTask::cook_single`](super::CookTask::cook_single), and the
/// parallel dispatcher only shares `&dyn CookContext` with workers, so the
/// working set cannot change while a batch is in flight.
pub trait CookContext: Sync {
    fn platform(&self) -> Platform;

    fn paths(&self) -> &ContentPaths;

    fn tools_dir(&self) -> &Path;

    fn debug_only(&self) -> bool;

    fn force_dictionary_regeneration(&self) -> bool;

    fn package_config(&self) -> Option<&PackageConfig>;

    /// Every known source file of `file_type`, excluded folders included
    fn source_files_of_type(&self, file_type: FileType) -> &[FilePath];

    fn database(&self) -> &dyn CookDatabase;

    fn source_control(&self) -> &dyn SourceControl;

    fn progress(&self) -> &dyn CookProgress;

    /// Worker threads available to a parallel batch
    fn parallelism(&self) -> usize;

    /// Limit applied to converter processes
    fn process_timeout(&self) -> Option<Duration>;

    /// Add content-relative paths to the working set
    fn amend_source_files(&mut self, paths: &[String]) -> Result<()>;

    /// Remove content-relative paths from the working set
    fn remove_source_files(&mut self, paths: &[String]) -> Result<()>;

    /// Depot file type for files the cooker opens
    ///
    /// Cooked outputs need an exclusive lock; generated source files do not.
    fn source_control_file_type_options(&self, needs_exclusive_lock: bool, long_life: bool) -> FileTypeOptions {
        if needs_exclusive_lock {
            FileTypeOptions::cooked(long_life)
        } else {
            FileTypeOptions::generated(long_life)
        }
    }

    fn advance_progress(&self, kind: &str, elapsed: Duration, fraction: f32, active: u32, total: u32) {
        self.progress().advance(kind, elapsed, fraction, active, total);
    }

    fn complete_progress(&self, kind: &str, elapsed: Duration, success: bool) {
        self.progress().complete(kind, elapsed, success);
    }
}
