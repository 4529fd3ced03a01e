// src/commands/cook.rs

//! Cook command - cook everything out of date, or one file

use crate::cli::CookArgs;
use anyhow::{Context, Result, bail};
use cooker::config::{CookerConfig, CookerSettings};
use cooker::content::{ContentPaths, FilePath, Platform};
use cooker::database::{COOKER_VERSION, data_version};
use cooker::progress::CliProgress;
use cooker::scc::PerforceParams;
use cooker::Cooker;
use std::path::Path;
use tracing::{info, warn};

/// Run a cook with settings taken from `args`
pub fn cmd_cook(config_path: Option<&Path>, platform: Platform, args: &CookArgs) -> Result<()> {
    let config = CookerConfig::load_or_default(config_path).context("Failed to load cooker config")?;

    if let Some(expected) = args.cooker_version
        && expected != COOKER_VERSION
    {
        bail!(
            "Cooker version mismatch: expected {} got {}; the cooker likely needs to be rebuilt or synced",
            expected,
            COOKER_VERSION
        );
    }

    let mut settings = CookerSettings::new(platform)
        .with_debug_only(args.debug_only)
        .with_local(args.local)
        .with_force_dictionary_regeneration(args.force_gen_cdict);

    if let Some(package) = &args.package_file {
        settings = settings.with_package_config(package.clone());
    }

    if args.has_perforce_args() {
        settings = settings.with_perforce(PerforceParams {
            changelist: args.p4_change.unwrap_or(0),
            client_workspace: args.p4_client.clone().unwrap_or_default(),
            port: args.p4_port.clone().unwrap_or_default(),
            user: args.p4_user.clone().unwrap_or_default(),
        });
    }

    if let Some(raw) = &args.out_file {
        let paths = ContentPaths::new(config.source_dir(), config.content_dir(), platform);
        let path = resolve_out_file(&paths, raw)?;

        if let Some(expected) = args.data_version {
            let actual = data_version(path.file_type());
            if expected != actual {
                bail!(
                    "Data version mismatch for {}: expected {} got {}; the cooker likely needs to be rebuilt or synced",
                    path.file_type(),
                    expected,
                    actual
                );
            }
        }
        settings = settings.with_single_cook_path(path);
    } else if args.data_version.is_some() {
        warn!("--data-version only applies to single file cooks, ignoring");
    }

    let mut cooker = Cooker::builder(config, settings)
        .progress(Box::new(CliProgress::new()))
        .build()
        .context("Failed to start cooker")?;

    cooker.run().context("Cook failed")?;

    match &cooker.state().settings().single_cook_path {
        Some(path) => info!("Cooked {}", path),
        None => info!("All {} content is up to date", platform),
    }
    Ok(())
}

/// Turn an `--out-file` argument into a content identity
///
/// Accepts a content-relative path or an absolute path under the source or
/// platform content directory. The source file must exist.
fn resolve_out_file(paths: &ContentPaths, raw: &str) -> Result<FilePath> {
    let raw_path = Path::new(raw);
    let path = if raw_path.is_absolute() {
        let content_dir = paths.platform_content_dir();
        let root = if raw_path.starts_with(&content_dir) {
            content_dir
        } else {
            paths.source_dir().to_path_buf()
        };
        FilePath::from_root_relative(&root, raw_path)
    } else {
        FilePath::parse(raw)
    }
    .with_context(|| format!("--out-file argument is invalid: {}", raw))?;

    if !paths.source_path(&path).is_file() {
        bail!("--out-file argument is invalid, source does not exist: {}", path.relative_source());
    }
    Ok(path)
}
