// src/tasks/mod.rs

//! Built-in cook tasks
//!
//! Each task wraps one external converter. Tasks resolve their converter in
//! the tools directory first and fall back to `PATH`.

mod font;
mod scene_asset;
mod script;
mod texture;
mod ui_movie;

pub use font::FontCookTask;
pub use scene_asset::SceneAssetCookTask;
pub use script::ScriptCookTask;
pub use texture::TextureCookTask;
pub use ui_movie::UiMovieCookTask;

use crate::cook::process::{ProcessOptions, ProcessOutput, run_command_line_process};
use crate::cook::{CookContext, CookTask};
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Every built-in task, in priority order
pub fn default_registry() -> Vec<Box<dyn CookTask>> {
    let mut tasks: Vec<Box<dyn CookTask>> = vec![
        Box::new(UiMovieCookTask::new()),
        Box::new(TextureCookTask::new()),
        Box::new(FontCookTask::new()),
        Box::new(SceneAssetCookTask::new()),
        Box::new(ScriptCookTask::new()),
    ];
    tasks.sort_by_key(|task| task.priority());
    tasks
}

/// Locate a converter binary
///
/// `candidates` are paths relative to the tools directory, tried in order;
/// the file name of the first candidate is then looked up on `PATH`.
pub fn resolve_tool(ctx: &dyn CookContext, candidates: &[&str]) -> Result<PathBuf> {
    for candidate in candidates {
        let path = ctx.tools_dir().join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }

    let name = candidates
        .first()
        .and_then(|c| Path::new(c).file_name())
        .ok_or_else(|| Error::Environment("no converter name given".to_string()))?;
    which::which(name).map_err(|_| {
        Error::Environment(format!(
            "converter {} not found in {} or on PATH",
            name.to_string_lossy(),
            ctx.tools_dir().display()
        ))
    })
}

/// Run a converter with the run's process timeout
///
/// Converters report problems on stderr, so any stderr output fails the cook.
pub(crate) fn run_converter<S: AsRef<OsStr>>(
    ctx: &dyn CookContext,
    working_dir: Option<&Path>,
    tool: &Path,
    args: &[S],
) -> Result<ProcessOutput> {
    let options = ProcessOptions::strict().with_timeout(ctx.process_timeout());
    run_command_line_process(working_dir, tool, args, &options)
}

/// Scratch directory for converter output, removed on drop
pub(crate) fn scratch_dir() -> Result<tempfile::TempDir> {
    Ok(tempfile::Builder::new().prefix("cooker-").tempdir()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = default_registry().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "UiMovieCookTask",
                "TextureCookTask",
                "FontCookTask",
                "SceneAssetCookTask",
                "ScriptCookTask"
            ]
        );
    }

    #[test]
    fn test_every_cookable_type_has_one_owner() {
        use crate::content::{FilePath, FileType};

        let tasks = default_registry();
        for file_type in FileType::COOKABLE {
            let path = FilePath::parse("Some/Asset.txt").unwrap().with_type(file_type);
            let owners = tasks.iter().filter(|t| t.can_cook(&path)).count();
            assert_eq!(owners, 1, "{:?}", file_type);
        }
    }
}
