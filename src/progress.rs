// src/progress.rs

//! Progress reporting for cook stages
//!
//! Each stage reports under a kind string such as `PC-ScriptCookTask`.
//! Reports are coarse: a stage advances when it starts and as serial items
//! finish, and completes once. Parallel batches only report at start and end.
//!
//! Implementations:
//! - `CliProgress`: one indicatif spinner per stage
//! - `LogProgress`: logs to tracing
//! - `SilentProgress`: no-op for scripted/quiet modes
//! - `CallbackProgress`: forwards events to a closure

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};

/// Sink for stage progress
///
/// Called from the driver thread and, for parallel batches, from whichever
/// thread starts or finishes the batch.
pub trait CookProgress: Send + Sync {
    fn advance(&self, kind: &str, elapsed: Duration, fraction: f32, active: u32, total: u32);

    fn complete(&self, kind: &str, elapsed: Duration, success: bool);
}

/// Silent progress (no-op)
#[derive(Debug, Default)]
pub struct SilentProgress;

impl CookProgress for SilentProgress {
    fn advance(&self, _kind: &str, _elapsed: Duration, _fraction: f32, _active: u32, _total: u32) {}

    fn complete(&self, _kind: &str, _elapsed: Duration, _success: bool) {}
}

/// Logs progress at info level
#[derive(Debug, Default)]
pub struct LogProgress;

impl CookProgress for LogProgress {
    fn advance(&self, kind: &str, elapsed: Duration, fraction: f32, active: u32, total: u32) {
        info!(
            "{}: {:.0}% ({} active, {} remaining, {:.1}s)",
            kind,
            fraction * 100.0,
            active,
            total,
            elapsed.as_secs_f32()
        );
    }

    fn complete(&self, kind: &str, elapsed: Duration, success: bool) {
        if success {
            info!("{}: done in {:.1}s", kind, elapsed.as_secs_f32());
        } else {
            error!("{}: FAILED after {:.1}s", kind, elapsed.as_secs_f32());
        }
    }
}

/// Interactive spinners, one line per stage
pub struct CliProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bar(&self, kind: &str) -> Option<ProgressBar> {
        let mut bars = self.bars.lock().ok()?;
        let bar = bars.entry(kind.to_string()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new_spinner());
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix:.bold} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_prefix(kind.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Some(bar.clone())
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CookProgress for CliProgress {
    fn advance(&self, kind: &str, elapsed: Duration, fraction: f32, active: u32, total: u32) {
        if let Some(bar) = self.bar(kind) {
            bar.set_message(format!(
                "{:>3.0}% [{} active, {} remaining] {:.1}s",
                fraction * 100.0,
                active,
                total,
                elapsed.as_secs_f32()
            ));
        }
    }

    fn complete(&self, kind: &str, elapsed: Duration, success: bool) {
        if let Some(bar) = self.bar(kind) {
            let status = if success { "done" } else { "FAILED" };
            bar.finish_with_message(format!("{} in {:.1}s", status, elapsed.as_secs_f32()));
        }
    }
}

/// Events emitted by [`CallbackProgress`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Advance {
        kind: String,
        fraction: f32,
        active: u32,
        total: u32,
    },
    Complete {
        kind: String,
        success: bool,
    },
}

/// Calls a user-provided function on every report
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> CookProgress for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn advance(&self, kind: &str, _elapsed: Duration, fraction: f32, active: u32, total: u32) {
        (self.callback)(ProgressEvent::Advance {
            kind: kind.to_string(),
            fraction,
            active,
            total,
        });
    }

    fn complete(&self, kind: &str, _elapsed: Duration, success: bool) {
        (self.callback)(ProgressEvent::Complete {
            kind: kind.to_string(),
            success,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_callback_progress() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let progress = CallbackProgress::new(move |event| {
            events_clone.lock().unwrap().push(event);
        });

        progress.advance("PC-ScriptCookTask", Duration::ZERO, 0.0, 4, 10);
        progress.complete("PC-ScriptCookTask", Duration::from_secs(1), true);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert!(matches!(&captured[0], ProgressEvent::Advance { active: 4, total: 10, .. }));
        assert!(matches!(&captured[1], ProgressEvent::Complete { success: true, .. }));
    }

    #[test]
    fn test_log_and_silent_progress() {
        let reporters: Vec<Box<dyn CookProgress>> = vec![Box::new(LogProgress), Box::new(SilentProgress)];
        for progress in reporters {
            progress.advance("PC-FontCookTask", Duration::ZERO, 0.5, 1, 1);
            progress.complete("PC-FontCookTask", Duration::ZERO, false);
        }
    }

    #[test]
    fn test_cli_progress_reuses_bar_per_kind() {
        let progress = CliProgress::new();
        progress.advance("PC-TextureCookTask", Duration::ZERO, 0.0, 2, 2);
        progress.advance("PC-TextureCookTask", Duration::ZERO, 0.5, 1, 1);
        progress.complete("PC-TextureCookTask", Duration::ZERO, true);
        assert_eq!(progress.bars.lock().unwrap().len(), 1);
    }
}
