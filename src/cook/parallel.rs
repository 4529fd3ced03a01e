// src/cook/parallel.rs

//! Lock-free parallel dispatch of one stage's batch
//!
//! The batch is split into work units. Each unit owns an atomic claim index;
//! workers claim from a unit with a single `fetch_add` until it is exhausted,
//! then move on to the next unit. Every item lands in its own result slot, a
//! failure never stops other items, and the batch always runs to completion.

use super::batch::group_ranges;
use super::context::CookContext;
use super::task::CookTask;
use crate::content::FilePath;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const PENDING: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;

/// A claimable run of batch indices
#[derive(Debug)]
struct WorkUnit {
    start: usize,
    count: usize,
    /// Items taken per claim: 1 for plain batches, `count` for a group
    claim: usize,
    next: AtomicUsize,
}

impl WorkUnit {
    fn new(start: usize, count: usize, claim: usize) -> Self {
        Self {
            start,
            count,
            claim: claim.max(1),
            next: AtomicUsize::new(0),
        }
    }

    fn claim(&self) -> Option<Range<usize>> {
        let offset = self.next.fetch_add(self.claim, Ordering::Relaxed);
        if offset >= self.count {
            return None;
        }
        let end = (offset + self.claim).min(self.count);
        Some(self.start + offset..self.start + end)
    }
}

/// Per-item results of a parallel batch, in batch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    results: Vec<bool>,
}

impl BatchOutcome {
    pub fn results(&self) -> &[bool] {
        &self.results
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|ok| *ok)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|ok| !**ok).count()
    }

    /// Items of `batch` that cooked successfully
    pub fn succeeded(&self, batch: &[FilePath]) -> Vec<FilePath> {
        batch
            .iter()
            .zip(&self.results)
            .filter(|(_, ok)| **ok)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

/// Fans one task's batch out over a scoped worker pool
pub struct ParallelCook<'a, T: CookTask + ?Sized> {
    task: &'a T,
    ctx: &'a dyn CookContext,
    batch: &'a [FilePath],
    workers: Option<usize>,
}

impl<'a, T: CookTask + ?Sized> ParallelCook<'a, T> {
    pub fn new(task: &'a T, ctx: &'a dyn CookContext, batch: &'a [FilePath]) -> Self {
        Self {
            task,
            ctx,
            batch,
            workers: None,
        }
    }

    /// Override the pool size instead of using the context's parallelism
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Cook the whole batch
    ///
    /// With `grouped`, consecutive items sharing a path form one unit that is
    /// claimed whole and handed to `internal_cook_multi`. An `Err` here means
    /// the batch could not start (or an internal invariant broke); per-item
    /// cook failures are reported through the outcome.
    pub fn run(&self, grouped: bool) -> Result<BatchOutcome> {
        let total = self.batch.len();
        if total == 0 {
            return Ok(BatchOutcome { results: Vec::new() });
        }

        self.create_output_dirs()?;

        let units: Vec<WorkUnit> = if grouped {
            group_ranges(self.batch)
                .into_iter()
                .map(|r| WorkUnit::new(r.start, r.len(), r.len()))
                .collect()
        } else {
            vec![WorkUnit::new(0, total, 1)]
        };
        let claims = if grouped { units.len() } else { total };
        let workers = self
            .workers
            .unwrap_or_else(|| self.ctx.parallelism())
            .clamp(1, claims);

        let slots: Vec<AtomicU8> = (0..total).map(|_| AtomicU8::new(PENDING)).collect();
        let duplicates = AtomicUsize::new(0);

        let kind = self.task.progress_kind(self.ctx);
        let start = Instant::now();
        self.ctx
            .advance_progress(&kind, Duration::ZERO, 0.0, workers as u32, claims as u32);
        debug!(
            "{}: cooking {} item(s) in {} unit(s) on {} worker(s)",
            self.task.name(),
            total,
            units.len(),
            workers
        );

        thread::scope(|scope| {
            let (units, slots, duplicates) = (&units, &slots, &duplicates);
            for worker in 1..workers {
                scope.spawn(move || self.work(worker, workers, units, slots, duplicates));
            }
            self.work(0, workers, units, slots, duplicates);
        });

        let pending = slots
            .iter()
            .filter(|s| s.load(Ordering::Acquire) == PENDING)
            .count();
        let duplicates = duplicates.load(Ordering::Acquire);
        if pending > 0 || duplicates > 0 {
            return Err(Error::Internal(format!(
                "{}: dispatcher left {} item(s) unclaimed and claimed {} twice",
                self.task.name(),
                pending,
                duplicates
            )));
        }

        let results: Vec<bool> = slots
            .iter()
            .map(|s| s.load(Ordering::Acquire) == SUCCEEDED)
            .collect();
        self.ctx.advance_progress(&kind, start.elapsed(), 1.0, 0, 0);

        Ok(BatchOutcome { results })
    }

    fn create_output_dirs(&self) -> Result<()> {
        let paths = self.ctx.paths();
        let dirs: HashSet<_> = self
            .batch
            .iter()
            .filter_map(|p| paths.cooked_path(p).parent().map(|d| d.to_path_buf()))
            .collect();
        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::cook_failed(dir.display(), format!("failed creating output directory: {}", e))
            })?;
        }
        Ok(())
    }

    fn work(
        &self,
        worker: usize,
        workers: usize,
        units: &[WorkUnit],
        slots: &[AtomicU8],
        duplicates: &AtomicUsize,
    ) {
        // Spread workers over the units so grouped batches start uncontended
        let first = worker * units.len() / workers;
        for k in 0..units.len() {
            let unit = &units[(first + k) % units.len()];
            while let Some(range) = unit.claim() {
                let items = &self.batch[range.clone()];
                let result = if items.len() == 1 {
                    self.task.internal_cook(self.ctx, &items[0])
                } else {
                    self.task.internal_cook_multi(self.ctx, items)
                };

                let state = match result {
                    Ok(()) => SUCCEEDED,
                    Err(e) => {
                        for item in items {
                            error!("{}: failed to cook {}: {}", self.task.name(), item, e);
                        }
                        FAILED
                    }
                };

                for slot in &slots[range] {
                    if slot
                        .compare_exchange(PENDING, state, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        duplicates.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_unit_claims_single_items() {
        let unit = WorkUnit::new(10, 3, 1);
        assert_eq!(unit.claim(), Some(10..11));
        assert_eq!(unit.claim(), Some(11..12));
        assert_eq!(unit.claim(), Some(12..13));
        assert_eq!(unit.claim(), None);
        assert_eq!(unit.claim(), None);
    }

    #[test]
    fn test_work_unit_claims_whole_group() {
        let unit = WorkUnit::new(4, 5, 5);
        assert_eq!(unit.claim(), Some(4..9));
        assert_eq!(unit.claim(), None);
    }

    #[test]
    fn test_batch_outcome() {
        let batch = vec![
            FilePath::parse("A.lua").unwrap(),
            FilePath::parse("B.lua").unwrap(),
        ];
        let outcome = BatchOutcome {
            results: vec![true, false],
        };
        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.succeeded(&batch), vec![batch[0].clone()]);
    }
}
