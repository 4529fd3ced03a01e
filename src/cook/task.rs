// src/cook/task.rs

//! The cook task contract

use super::batch;
use super::context::CookContext;
use crate::content::FilePath;
use crate::database::CookSource;
use crate::error::{Error, Result};

/// One kind of conversion: one or more file types into a runtime format
///
/// Tasks are shared with worker threads during parallel batches, so every
/// per-file hook takes `&self` and a read-only context.
pub trait CookTask: Send + Sync {
    /// Stable name used in progress kinds and logs, e.g. `ScriptCookTask`
    fn name(&self) -> &str;

    /// Stage ordering key; lower runs first
    fn priority(&self) -> i32;

    /// True if this task is the sole owner of cooking `path`
    ///
    /// Tasks that only cook whole batches keep the default.
    fn can_cook(&self, _path: &FilePath) -> bool {
        false
    }

    /// Cook everything this task owns that is out of date
    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()>;

    /// Cook exactly one file, through the same per-file path a batch uses
    fn cook_single(&self, ctx: &mut dyn CookContext, path: &FilePath) -> Result<()> {
        let ctx: &dyn CookContext = ctx;
        self.internal_cook(ctx, path)?;
        batch::post_cook_update_metadata(self, ctx, std::slice::from_ref(path))
    }

    /// One-time precondition check, run for every task before any cooking
    fn validate_content_environment(&self, _ctx: &dyn CookContext) -> Result<()> {
        Ok(())
    }

    /// Dependency set of `path`; empty means the file depends only on itself
    fn get_sources(&self, _ctx: &dyn CookContext, _path: &FilePath) -> Result<Vec<CookSource>> {
        Ok(Vec::new())
    }

    /// Convert one file
    fn internal_cook(&self, _ctx: &dyn CookContext, _path: &FilePath) -> Result<()> {
        Err(Error::Unsupported {
            task: self.name().to_string(),
            operation: "single file cook",
        })
    }

    /// Convert a group of same-path files of different types
    ///
    /// The default cooks each member in turn and stops at the first failure.
    fn internal_cook_multi(&self, ctx: &dyn CookContext, group: &[FilePath]) -> Result<()> {
        for path in group {
            self.internal_cook(ctx, path)?;
        }
        Ok(())
    }

    /// Progress kind, `<Platform>-<TaskName>`
    fn progress_kind(&self, ctx: &dyn CookContext) -> String {
        format!("{}-{}", ctx.platform(), self.name())
    }
}
