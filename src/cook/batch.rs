// src/cook/batch.rs

//! Default out-of-date flows shared by cook tasks

use super::context::CookContext;
use super::parallel::ParallelCook;
use super::task::CookTask;
use crate::content::{FilePath, FileType};
use crate::database::timestamp::{copy_modified_time, modified_time};
use crate::database::{CookSource, SourceKind};
use crate::error::{Error, Result};
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ranges of consecutive items sharing the same relative path
pub fn group_ranges(batch: &[FilePath]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..=batch.len() {
        if i == batch.len() || batch[i].relative() != batch[start].relative() {
            ranges.push(start..i);
            start = i;
        }
    }
    ranges
}

/// Every source file of `file_type` the database reports stale
///
/// Files in other platforms' generated folders are skipped.
pub fn gather_out_of_date_of_source_type(ctx: &dyn CookContext, file_type: FileType) -> Result<Vec<FilePath>> {
    let paths = ctx.paths();
    let db = ctx.database();
    let mut stale = Vec::new();
    for path in ctx.source_files_of_type(file_type) {
        if paths.is_excluded(path) {
            continue;
        }
        let path = path.with_type(file_type);
        if !db.check_up_to_date(&path)? {
            stale.push(path);
        }
    }
    Ok(stale)
}

/// Refresh freshness metadata for files that were just cooked
///
/// Stamps each cooked output with its source's modification time, then
/// records the task's dependency set. Every recorded dependency must exist.
pub fn post_cook_update_metadata<T: CookTask + ?Sized>(
    task: &T,
    ctx: &dyn CookContext,
    cooked: &[FilePath],
) -> Result<()> {
    let paths = ctx.paths();
    let db = ctx.database();

    for path in cooked {
        let metadata_error = |reason: String| Error::Metadata {
            file: path.to_string(),
            reason,
        };

        let stamp = copy_modified_time(&paths.source_path(path), &paths.cooked_path(path))
            .map_err(|e| metadata_error(format!("failed matching modification time: {}", e)))?;
        db.on_file_change(path);

        let mut sources = task.get_sources(ctx, path)?;
        if sources.is_empty() {
            sources.push(CookSource::source(path));
        }

        for source in &sources {
            let location = match source.kind {
                SourceKind::Directory => continue,
                SourceKind::Source => paths.source_dir().join(&source.relative),
                SourceKind::Sibling => paths.platform_content_dir().join(&source.relative),
            };
            if modified_time(&location) == 0 {
                return Err(metadata_error(format!(
                    "dependency {} does not exist",
                    source.relative
                )));
            }
        }

        db.update_metadata(path, stamp, &sources)?;
    }

    Ok(())
}

/// Gather, cook and record one file type
///
/// Returns the gathered batch. Serial cooks stop at the first failure;
/// parallel cooks run every item. Metadata is refreshed for whatever cooked
/// successfully even when the stage fails.
pub fn default_out_of_date_cook<T: CookTask + ?Sized>(
    task: &T,
    ctx: &dyn CookContext,
    file_type: FileType,
    can_run_in_parallel: bool,
) -> Result<Vec<FilePath>> {
    let batch = gather_out_of_date_of_source_type(ctx, file_type)?;
    cook_batch(task, ctx, &batch, false, can_run_in_parallel)?;
    Ok(batch)
}

/// Gather, cook and record a contiguous range of file types
///
/// The batch is sorted by path then type, and items sharing a path are
/// handed to `internal_cook_multi` together.
pub fn default_out_of_date_cook_multi<T: CookTask + ?Sized>(
    task: &T,
    ctx: &dyn CookContext,
    first: FileType,
    last: FileType,
    can_run_in_parallel: bool,
) -> Result<Vec<FilePath>> {
    let mut batch = Vec::new();
    for file_type in FileType::range(first, last) {
        batch.extend(gather_out_of_date_of_source_type(ctx, file_type)?);
    }
    batch.sort();
    cook_batch(task, ctx, &batch, true, can_run_in_parallel)?;
    Ok(batch)
}

fn cook_batch<T: CookTask + ?Sized>(
    task: &T,
    ctx: &dyn CookContext,
    batch: &[FilePath],
    grouped: bool,
    parallel: bool,
) -> Result<()> {
    if batch.is_empty() {
        debug!("{}: nothing out of date", task.name());
        return Ok(());
    }

    info!("{}: cooking {} file(s)", task.name(), batch.len());
    let kind = task.progress_kind(ctx);
    let start = Instant::now();

    let (cooked, failed) = if parallel {
        match ParallelCook::new(task, ctx, batch).run(grouped) {
            Ok(outcome) => (outcome.succeeded(batch), outcome.failed()),
            Err(e) => {
                ctx.complete_progress(&kind, start.elapsed(), false);
                return Err(e);
            }
        }
    } else {
        cook_serial(task, ctx, batch, grouped, &kind, start)
    };

    let metadata = post_cook_update_metadata(task, ctx, &cooked);
    let success = failed == 0 && metadata.is_ok();
    ctx.complete_progress(&kind, start.elapsed(), success);

    metadata?;
    if failed > 0 {
        return Err(Error::BatchFailed {
            task: task.name().to_string(),
            failed,
            total: batch.len(),
        });
    }
    Ok(())
}

/// Returns the cooked items and the size of the failing unit, if any
fn cook_serial<T: CookTask + ?Sized>(
    task: &T,
    ctx: &dyn CookContext,
    batch: &[FilePath],
    grouped: bool,
    kind: &str,
    start: Instant,
) -> (Vec<FilePath>, usize) {
    let units: Vec<Range<usize>> = if grouped {
        group_ranges(batch)
    } else {
        (0..batch.len()).map(|i| i..i + 1).collect()
    };

    let total = batch.len();
    let mut cooked = Vec::with_capacity(total);
    for range in units {
        let items = &batch[range];
        ctx.advance_progress(
            kind,
            start.elapsed(),
            cooked.len() as f32 / total as f32,
            items.len() as u32,
            (total - cooked.len()) as u32,
        );

        let result = if items.len() == 1 {
            task.internal_cook(ctx, &items[0])
        } else {
            task.internal_cook_multi(ctx, items)
        };

        match result {
            Ok(()) => cooked.extend_from_slice(items),
            Err(e) => {
                for item in items {
                    error!("{}: failed to cook {}: {}", task.name(), item, e);
                }
                return (cooked, items.len());
            }
        }
    }

    (cooked, 0)
}
