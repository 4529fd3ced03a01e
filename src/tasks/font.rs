// src/tasks/font.rs

//! TrueType fonts to signed-distance-field font data

use super::{resolve_tool, run_converter, scratch_dir};
use crate::content::{FilePath, FileType};
use crate::cook::{CookContext, CookTask, atomic_move_final_output, batch, priority};
use crate::error::Result;
use std::ffi::OsStr;

const FONT_COOKER: &[&str] = &["FontCooker"];

#[derive(Debug, Default)]
pub struct FontCookTask;

impl FontCookTask {
    pub fn new() -> Self {
        Self
    }
}

impl CookTask for FontCookTask {
    fn name(&self) -> &str {
        "FontCookTask"
    }

    fn priority(&self) -> i32 {
        priority::FONT
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        path.file_type() == FileType::Font
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        batch::default_out_of_date_cook(self, &*ctx, FileType::Font, false)?;
        Ok(())
    }

    fn validate_content_environment(&self, ctx: &dyn CookContext) -> Result<()> {
        resolve_tool(ctx, FONT_COOKER).map(|_| ())
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        let cooker = resolve_tool(ctx, FONT_COOKER)?;
        let scratch = scratch_dir()?;
        let output = scratch.path().join("font.sff");

        run_converter(
            ctx,
            None,
            &cooker,
            &[
                ctx.paths().source_path(path).as_os_str(),
                OsStr::new("-o"),
                output.as_os_str(),
            ],
        )?;

        atomic_move_final_output(&output, &ctx.paths().cooked_path(path))
    }
}
