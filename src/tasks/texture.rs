// src/tasks/texture.rs

//! Source images to per-mip-level compressed textures

use super::{resolve_tool, run_converter, scratch_dir};
use crate::content::{FilePath, FileType};
use crate::cook::{CookContext, CookTask, atomic_move_final_output, batch, priority};
use crate::error::Result;

const TEXTURE_COOKER: &[&str] = &["TextureCooker"];

/// Cooks `.sif0` through `.sif4` from one `.png`
///
/// Variants of the same image are cooked together so the compressor decodes
/// the source once per image instead of once per variant.
#[derive(Debug, Default)]
pub struct TextureCookTask;

impl TextureCookTask {
    pub fn new() -> Self {
        Self
    }

    /// Whether the source already carries premultiplied alpha
    fn source_is_premultiplied(path: &FilePath) -> bool {
        let relative = path.relative();
        relative
            .get(..9)
            .is_some_and(|head| head.eq_ignore_ascii_case("Generated"))
            || relative.ends_with("_nopre")
    }

    fn mip_level(file_type: FileType) -> usize {
        file_type as usize - FileType::FIRST_TEXTURE as usize
    }
}

impl CookTask for TextureCookTask {
    fn name(&self) -> &str {
        "TextureCookTask"
    }

    fn priority(&self) -> i32 {
        priority::TEXTURE
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        path.file_type().is_texture()
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        batch::default_out_of_date_cook_multi(
            self,
            &*ctx,
            FileType::FIRST_TEXTURE,
            FileType::LAST_TEXTURE,
            true,
        )?;
        Ok(())
    }

    fn validate_content_environment(&self, ctx: &dyn CookContext) -> Result<()> {
        resolve_tool(ctx, TEXTURE_COOKER).map(|_| ())
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        self.internal_cook_multi(ctx, std::slice::from_ref(path))
    }

    /// One compressor run for every requested variant of one image
    fn internal_cook_multi(&self, ctx: &dyn CookContext, group: &[FilePath]) -> Result<()> {
        let Some(first) = group.first() else {
            return Ok(());
        };

        let cooker = resolve_tool(ctx, TEXTURE_COOKER)?;
        let scratch = scratch_dir()?;

        let mut args = vec![
            "-i".to_string(),
            ctx.paths().source_path(first).to_string_lossy().into_owned(),
            "-platform".to_string(),
            ctx.platform().to_string(),
        ];
        if Self::source_is_premultiplied(first) {
            args.push("-premultiplied".to_string());
        }

        let mut outputs = Vec::with_capacity(group.len());
        for path in group {
            let level = Self::mip_level(path.file_type());
            let scratch_out = scratch.path().join(format!("mip{}.bin", level));
            args.push(format!("-o{}", level));
            args.push(scratch_out.to_string_lossy().into_owned());
            outputs.push((scratch_out, path));
        }

        run_converter(ctx, None, &cooker, &args)?;

        for (scratch_out, path) in outputs {
            atomic_move_final_output(&scratch_out, &ctx.paths().cooked_path(path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_every_texture_variant() {
        let task = TextureCookTask::new();
        let base = FilePath::parse("Art/Hero.png").unwrap();
        for variant in FileType::texture_variants() {
            assert!(task.can_cook(&base.with_type(variant)));
        }
        assert!(!task.can_cook(&base.with_type(FileType::UiMovie)));
    }

    #[test]
    fn test_premultiplied_sources() {
        assert!(TextureCookTask::source_is_premultiplied(
            &FilePath::parse("GeneratedPC/UIImages/Menu/a.png").unwrap()
        ));
        assert!(TextureCookTask::source_is_premultiplied(
            &FilePath::parse("Art/Glow_nopre.png").unwrap()
        ));
        assert!(!TextureCookTask::source_is_premultiplied(
            &FilePath::parse("Art/Hero.png").unwrap()
        ));
    }

    #[test]
    fn test_mip_level() {
        assert_eq!(TextureCookTask::mip_level(FileType::Texture0), 0);
        assert_eq!(TextureCookTask::mip_level(FileType::Texture4), 4);
    }
}
