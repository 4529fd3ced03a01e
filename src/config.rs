// src/config.rs

//! Cooker configuration
//!
//! `CookerConfig` describes the project layout and is read from an optional
//! `cooker.toml`. `CookerSettings` describes a single run and is built from
//! command-line flags.

use crate::content::{FilePath, Platform};
use crate::error::{Error, Result};
use crate::scc::PerforceParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "cooker.toml";

/// Project layout and resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookerConfig {
    /// Project root; other relative paths resolve against it
    pub base_dir: PathBuf,
    /// Authored content, defaults to `<base_dir>/Source`
    pub source_dir: Option<PathBuf>,
    /// Cooked output root, defaults to `<base_dir>/Data/Content`
    pub content_dir: Option<PathBuf>,
    /// Converter binaries, defaults to the directory of the running executable
    pub tools_dir: Option<PathBuf>,
    /// Cook database file, defaults to `<content_dir>/CookDatabase_<Platform>.db`
    pub database: Option<PathBuf>,
    /// Worker threads for parallel stages (0 = hardware concurrency)
    pub jobs: usize,
    /// Seconds to wait for another cooker to release the lock
    pub lock_timeout_secs: u64,
    /// Seconds before a converter process is killed (0 = never)
    pub process_timeout_secs: u64,
}

impl Default for CookerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            source_dir: None,
            content_dir: None,
            tools_dir: None,
            database: None,
            jobs: 0,
            lock_timeout_secs: 120,
            process_timeout_secs: 0,
        }
    }
}

impl CookerConfig {
    /// Config rooted at `base_dir` with default layout
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Load from a TOML file; relative paths resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config: CookerConfig = toml::from_str(&text)?;

        let anchor = path.parent().unwrap_or_else(|| Path::new("."));
        config.base_dir = anchor.join(&config.base_dir);
        debug!("Loaded cooker config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else `cooker.toml` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(self.source_dir.as_deref(), "Source")
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve(self.content_dir.as_deref(), "Data/Content")
    }

    pub fn tools_dir(&self) -> PathBuf {
        match &self.tools_dir {
            Some(dir) => self.base_dir.join(dir),
            None => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| self.base_dir.clone()),
        }
    }

    pub fn database_path(&self, platform: Platform) -> PathBuf {
        match &self.database {
            Some(db) => self.base_dir.join(db),
            None => self.content_dir().join(format!("CookDatabase_{}.db", platform)),
        }
    }

    /// Worker threads for parallel stages
    pub fn parallelism(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn process_timeout(&self) -> Option<Duration> {
        (self.process_timeout_secs > 0).then(|| Duration::from_secs(self.process_timeout_secs))
    }

    fn resolve(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        self.base_dir.join(configured.unwrap_or_else(|| Path::new(default)))
    }
}

/// Settings for one cook run
#[derive(Debug, Clone, Default)]
pub struct CookerSettings {
    pub platform: Platform,
    /// Cook only this file instead of everything out of date
    pub single_cook_path: Option<FilePath>,
    /// Package configuration handed to tasks
    pub package_config: Option<PathBuf>,
    /// Depot connection; `None` cooks without source control
    pub perforce: Option<PerforceParams>,
    /// Keep debug information in cooked output
    pub debug_only: bool,
    /// Local cook: skip syncing generated content before cooking
    pub local: bool,
    /// Regenerate compression dictionaries even if they exist
    pub force_dictionary_regeneration: bool,
}

impl CookerSettings {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    pub fn with_single_cook_path(mut self, path: FilePath) -> Self {
        self.single_cook_path = Some(path);
        self
    }

    pub fn with_package_config(mut self, path: PathBuf) -> Self {
        self.package_config = Some(path);
        self
    }

    pub fn with_perforce(mut self, params: PerforceParams) -> Self {
        self.perforce = Some(params);
        self
    }

    pub fn with_debug_only(mut self, debug_only: bool) -> Self {
        self.debug_only = debug_only;
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn with_force_dictionary_regeneration(mut self, force: bool) -> Self {
        self.force_dictionary_regeneration = force;
        self
    }

    pub fn is_single_cook(&self) -> bool {
        self.single_cook_path.is_some()
    }

    /// Check settings that do not need the file system beyond existence tests
    pub fn validate(&self) -> Result<()> {
        if let Some(package) = &self.package_config
            && !package.is_file()
        {
            return Err(Error::Config(format!(
                "package file {} does not exist",
                package.display()
            )));
        }
        if let Some(p4) = &self.perforce
            && !p4.is_valid()
        {
            return Err(Error::Config(
                "perforce parameters require changelist, client, port and user".to_string(),
            ));
        }
        Ok(())
    }
}

/// Package configuration handed through to tasks
///
/// The cooker does not interpret it; it only guarantees the file parsed.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    path: PathBuf,
    table: toml::Table,
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&text)?;
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.table.get(key)
    }
}
