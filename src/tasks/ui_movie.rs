// src/tasks/ui_movie.rs

//! Flash movies to runtime UI movies
//!
//! The UI converter extracts every bitmap of a movie into a per-movie image
//! folder under the generated source tree. Those images are cooked by the
//! texture stage, which runs later, and they are dependencies of the movie.

use super::{resolve_tool, run_converter, scratch_dir};
use crate::content::{FilePath, FileType};
use crate::cook::{CookContext, CookTask, atomic_write_final_output, batch, priority};
use crate::database::{CookSource, SourceKind};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const UI_COOKER: &[&str] = &["FalconCooker"];
const MINIMUM_SWF_VERSION: u32 = 15;
const COMPRESSION_LEVEL: i32 = 19;
const LOCAL_FOLDER: &str = "GeneratedLocal";

#[derive(Debug, Default)]
pub struct UiMovieCookTask;

impl UiMovieCookTask {
    pub fn new() -> Self {
        Self
    }

    /// Generated folder images are written to
    ///
    /// With source control this is the platform's checked-in folder; local
    /// cooks write to `GeneratedLocal` and only read the platform folder.
    fn output_folder(ctx: &dyn CookContext) -> String {
        if ctx.source_control().is_null() {
            LOCAL_FOLDER.to_string()
        } else {
            ctx.platform().generated_folder()
        }
    }

    /// `<folder>/UIImages`, relative to the source root
    fn images_root(ctx: &dyn CookContext) -> String {
        format!("{}/UIImages", Self::output_folder(ctx))
    }

    /// Folder holding the images extracted from `movie`
    fn image_dir(ctx: &dyn CookContext, movie: &FilePath) -> String {
        format!("{}/{}", Self::images_root(ctx), movie.relative())
    }

    fn converter_args(ctx: &dyn CookContext, movie: &FilePath, output: &Path) -> Vec<String> {
        let source_dir = ctx.paths().source_dir();
        let lossy = |p: PathBuf| p.to_string_lossy().into_owned();
        let prefix = format!("{}/", Self::image_dir(ctx, movie));

        let mut args = vec![
            lossy(ctx.paths().source_path(movie)),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "-img_dir".to_string(),
            lossy(source_dir.join(&prefix)),
        ];
        if ctx.source_control().is_null() {
            let input_only = format!(
                "{}/UIImages/{}/",
                ctx.platform().generated_folder(),
                movie.relative()
            );
            args.push("-in_only_img_dir".to_string());
            args.push(lossy(source_dir.join(&input_only)));
            args.push("-image_prefix".to_string());
            args.push(prefix);
            args.push("-in_only_image_prefix".to_string());
            args.push(input_only);
        } else {
            args.push("-image_prefix".to_string());
            args.push(prefix);
        }
        args.push("-no_lossy".to_string());
        args.push("-min_swf_version".to_string());
        args.push(MINIMUM_SWF_VERSION.to_string());
        args
    }

    /// Bring the generated image folder in line with the cooked movies
    ///
    /// Images whose movie no longer has cooked output are opened for delete
    /// and dropped from the working set. The rest are opened for add and
    /// amended so the texture stage picks them up.
    fn update_source_images(&self, ctx: &mut dyn CookContext, possibly_new_images: bool) -> Result<()> {
        if ctx.source_control().is_null() && !possibly_new_images {
            return Ok(());
        }

        let source_dir = ctx.paths().source_dir().to_path_buf();
        let content_dir = ctx.paths().platform_content_dir();
        let root = Self::images_root(&*ctx);
        let root_abs = source_dir.join(&root);
        if !root_abs.is_dir() {
            return Ok(());
        }

        let mut stale = Vec::new();
        let mut live = Vec::new();
        for entry in WalkDir::new(&root_abs).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Environment(format!("failed listing {}: {}", root_abs.display(), e))
            })?;
            let is_image = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(FileType::Texture0.source_extension()));
            if !entry.file_type().is_file() || !is_image {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&source_dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let movie_cooked = entry
                .path()
                .parent()
                .and_then(|dir| dir.strip_prefix(&root_abs).ok())
                .map(|movie| {
                    content_dir.join(format!(
                        "{}.{}",
                        movie.to_string_lossy(),
                        FileType::UiMovie.cooked_extension()
                    ))
                });

            if movie_cooked.is_some_and(|cooked| cooked.is_file()) {
                live.push((entry.path().to_path_buf(), relative));
            } else {
                stale.push((entry.path().to_path_buf(), relative));
            }
        }

        if !stale.is_empty() {
            let (files, relative): (Vec<PathBuf>, Vec<String>) = stale.into_iter().unzip();
            info!("Removing {} stale UI image(s)", files.len());
            ctx.source_control().open_for_delete(&files)?;
            ctx.remove_source_files(&relative)?;
        }

        if !live.is_empty() {
            let (files, relative): (Vec<PathBuf>, Vec<String>) = live.into_iter().unzip();
            debug!("Tracking {} UI image(s)", files.len());
            let options = ctx.source_control_file_type_options(false, false);
            ctx.source_control().open_for_add(&files, &options)?;
            ctx.amend_source_files(&relative)?;
        }

        Ok(())
    }
}

impl CookTask for UiMovieCookTask {
    fn name(&self) -> &str {
        "UiMovieCookTask"
    }

    fn priority(&self) -> i32 {
        priority::UI_MOVIE
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        path.file_type() == FileType::UiMovie
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        let cooked = batch::default_out_of_date_cook(self, &*ctx, FileType::UiMovie, false)?;
        self.update_source_images(ctx, !cooked.is_empty())
    }

    fn validate_content_environment(&self, ctx: &dyn CookContext) -> Result<()> {
        resolve_tool(ctx, UI_COOKER).map(|_| ())
    }

    /// The movie, every image extracted from it, and the image folder itself
    /// so that a removed image also invalidates the movie
    fn get_sources(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<Vec<CookSource>> {
        let mut sources = vec![CookSource::source(path)];

        let image_dir = Self::image_dir(ctx, path);
        let image_dir_abs = ctx.paths().source_dir().join(&image_dir);
        if image_dir_abs.is_dir() {
            let mut images: Vec<String> = fs::read_dir(&image_dir_abs)?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| {
                    Path::new(name)
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(FileType::Texture0.source_extension()))
                })
                .collect();
            images.sort();
            sources.extend(images.into_iter().map(|name| CookSource {
                relative: format!("{}/{}", image_dir, name),
                kind: SourceKind::Source,
            }));
        }

        sources.push(CookSource::directory(image_dir));
        Ok(sources)
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        let cooker = resolve_tool(ctx, UI_COOKER)?;
        let scratch = scratch_dir()?;
        let output = scratch.path().join("movie.fcn");

        let args = Self::converter_args(ctx, path, &output);
        run_converter(ctx, None, &cooker, &args)?;

        let raw = fs::read(&output)
            .map_err(|e| Error::cook_failed(path, format!("failed reading converter output: {}", e)))?;
        let compressed = zstd::encode_all(raw.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| Error::cook_failed(path, format!("failed compressing movie: {}", e)))?;

        atomic_write_final_output(&ctx.paths().cooked_path(path), &compressed)
    }
}
