// src/tasks/scene_asset.rs

//! Exported scene files to runtime scene assets

use super::{resolve_tool, run_converter, scratch_dir};
use crate::content::{FilePath, FileType};
use crate::cook::{CookContext, CookTask, atomic_move_final_output, batch, priority};
use crate::error::Result;

const SCENE_ASSET_COOKER: &[&str] = &["SceneAssetCooker"];

#[derive(Debug, Default)]
pub struct SceneAssetCookTask;

impl SceneAssetCookTask {
    pub fn new() -> Self {
        Self
    }
}

impl CookTask for SceneAssetCookTask {
    fn name(&self) -> &str {
        "SceneAssetCookTask"
    }

    fn priority(&self) -> i32 {
        priority::SCENE_ASSET
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        path.file_type() == FileType::SceneAsset
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        batch::default_out_of_date_cook(self, &*ctx, FileType::SceneAsset, true)?;
        Ok(())
    }

    fn validate_content_environment(&self, ctx: &dyn CookContext) -> Result<()> {
        resolve_tool(ctx, SCENE_ASSET_COOKER).map(|_| ())
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        let cooker = resolve_tool(ctx, SCENE_ASSET_COOKER)?;
        let scratch = scratch_dir()?;
        let output = scratch.path().join("scene.ssa");

        let args = vec![
            ctx.paths().source_path(path).to_string_lossy().into_owned(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "-platform".to_string(),
            ctx.platform().to_string(),
        ];
        run_converter(ctx, None, &cooker, &args)?;

        atomic_move_final_output(&output, &ctx.paths().cooked_path(path))
    }
}
