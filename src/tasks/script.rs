// src/tasks/script.rs

//! Lua scripts to compressed LuaJIT bytecode

use super::{resolve_tool, run_converter, scratch_dir};
use crate::content::{FilePath, FileType};
use crate::cook::{CookContext, CookTask, atomic_write_final_output, batch, priority};
use crate::error::{Error, Result};
use std::fs;

const LUAJIT: &[&str] = &["LuaJIT/luajit", "luajit"];
const COMPRESSION_LEVEL: i32 = 19;

#[derive(Debug, Default)]
pub struct ScriptCookTask;

impl ScriptCookTask {
    pub fn new() -> Self {
        Self
    }

    fn compiler_args(ctx: &dyn CookContext, path: &FilePath, output: &str) -> Vec<String> {
        let strip = if ctx.debug_only() { "-g" } else { "-s" };
        vec![
            "-b".to_string(),
            strip.to_string(),
            "-t".to_string(),
            "raw".to_string(),
            path.relative_source(),
            output.to_string(),
        ]
    }
}

impl CookTask for ScriptCookTask {
    fn name(&self) -> &str {
        "ScriptCookTask"
    }

    fn priority(&self) -> i32 {
        priority::SCRIPT
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        path.file_type() == FileType::Script
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        batch::default_out_of_date_cook(self, &*ctx, FileType::Script, true)?;
        Ok(())
    }

    fn validate_content_environment(&self, ctx: &dyn CookContext) -> Result<()> {
        resolve_tool(ctx, LUAJIT).map(|_| ())
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        let luajit = resolve_tool(ctx, LUAJIT)?;
        let scratch = scratch_dir()?;
        let bytecode = scratch.path().join("out.raw");

        // luajit resolves the script relative to the source root
        let args = Self::compiler_args(ctx, path, &bytecode.to_string_lossy());
        run_converter(ctx, Some(ctx.paths().source_dir()), &luajit, &args)?;

        let raw = fs::read(&bytecode)
            .map_err(|e| Error::cook_failed(path, format!("failed reading bytecode: {}", e)))?;
        let compressed = zstd::encode_all(raw.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| Error::cook_failed(path, format!("failed compressing bytecode: {}", e)))?;

        atomic_write_final_output(&ctx.paths().cooked_path(path), &compressed)
    }
}
