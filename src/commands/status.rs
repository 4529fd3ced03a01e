// src/commands/status.rs

//! Status command - report stale content without cooking

use anyhow::{Context, Result, bail};
use cooker::config::{CookerConfig, CookerSettings};
use cooker::content::{FileType, Platform};
use cooker::progress::SilentProgress;
use cooker::Cooker;
use std::path::Path;
use std::str::FromStr;

pub fn cmd_status(config_path: Option<&Path>, platform: Platform, file_type: Option<&str>) -> Result<()> {
    let only = match file_type {
        Some(name) => {
            let parsed = FileType::from_str(name).map_err(|_| anyhow::anyhow!("Unknown file type: {}", name))?;
            if !parsed.needs_cooking() {
                bail!("{} is never cooked", parsed);
            }
            Some(parsed)
        }
        None => None,
    };

    let config = CookerConfig::load_or_default(config_path).context("Failed to load cooker config")?;
    let cooker = Cooker::builder(config, CookerSettings::new(platform))
        .progress(Box::new(SilentProgress))
        .skip_version_processing()
        .build()
        .context("Failed to open content")?;

    let stale = cooker.status(only).context("Failed to query cook database")?;
    if stale.is_empty() {
        println!("All {} content is up to date", platform);
        return Ok(());
    }

    for entry in &stale {
        println!("{}", entry.path);
        for changed in &entry.changed {
            println!("    changed: {}", changed);
        }
    }
    println!();
    println!("{} file(s) out of date", stale.len());
    Ok(())
}
