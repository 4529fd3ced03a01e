// src/cook/cooker.rs

//! The cook driver
//!
//! A `Cooker` owns one run: the lock, the database, the source-control
//! client, the working set of source files and the ordered task list. Tasks
//! run one stage at a time in priority order; a failing stage ends the run.

use super::context::CookContext;
use super::lock::CookerLock;
use super::task::CookTask;
use crate::config::{CookerConfig, CookerSettings, PackageConfig};
use crate::content::{ContentPaths, FilePath, FileType, Platform, SourceFiles};
use crate::database::{CookDatabase, Freshness, SqliteCookDatabase};
use crate::error::{Error, Result};
use crate::progress::{CookProgress, LogProgress};
use crate::scc::{NullClient, PerforceClient, SourceControl};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Run state shared with tasks through [`CookContext`]
pub struct CookerState {
    settings: CookerSettings,
    paths: ContentPaths,
    tools_dir: PathBuf,
    database: Box<dyn CookDatabase>,
    source_control: Box<dyn SourceControl>,
    progress: Box<dyn CookProgress>,
    package: Option<PackageConfig>,
    source_files: SourceFiles,
    parallelism: usize,
    process_timeout: Option<Duration>,
}

impl CookerState {
    pub fn settings(&self) -> &CookerSettings {
        &self.settings
    }

    pub fn source_files(&self) -> &SourceFiles {
        &self.source_files
    }
}

impl CookContext for CookerState {
    fn platform(&self) -> Platform {
        self.settings.platform
    }

    fn paths(&self) -> &ContentPaths {
        &self.paths
    }

    fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    fn debug_only(&self) -> bool {
        self.settings.debug_only
    }

    fn force_dictionary_regeneration(&self) -> bool {
        self.settings.force_dictionary_regeneration
    }

    fn package_config(&self) -> Option<&PackageConfig> {
        self.package.as_ref()
    }

    fn source_files_of_type(&self, file_type: FileType) -> &[FilePath] {
        self.source_files.of_type(file_type)
    }

    fn database(&self) -> &dyn CookDatabase {
        self.database.as_ref()
    }

    fn source_control(&self) -> &dyn SourceControl {
        self.source_control.as_ref()
    }

    fn progress(&self) -> &dyn CookProgress {
        self.progress.as_ref()
    }

    fn parallelism(&self) -> usize {
        self.parallelism
    }

    fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout
    }

    fn amend_source_files(&mut self, paths: &[String]) -> Result<()> {
        self.source_files.amend(paths)
    }

    fn remove_source_files(&mut self, paths: &[String]) -> Result<()> {
        self.source_files.remove(paths)
    }
}

/// A stale file reported by [`Cooker::status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleEntry {
    pub path: FilePath,
    /// Dependencies that changed; empty for a global reason such as a
    /// version bump or missing output
    pub changed: Vec<String>,
}

/// Builds a [`Cooker`], optionally with injected collaborators
pub struct CookerBuilder {
    config: CookerConfig,
    settings: CookerSettings,
    tasks: Option<Vec<Box<dyn CookTask>>>,
    database: Option<Box<dyn CookDatabase>>,
    source_control: Option<Box<dyn SourceControl>>,
    progress: Option<Box<dyn CookProgress>>,
    source_files: Option<SourceFiles>,
    process_versions: bool,
}

impl CookerBuilder {
    pub fn new(config: CookerConfig, settings: CookerSettings) -> Self {
        Self {
            config,
            settings,
            tasks: None,
            database: None,
            source_control: None,
            progress: None,
            source_files: None,
            process_versions: true,
        }
    }

    /// Replace the built-in task registry
    pub fn tasks(mut self, tasks: Vec<Box<dyn CookTask>>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn database(mut self, database: Box<dyn CookDatabase>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn source_control(mut self, source_control: Box<dyn SourceControl>) -> Self {
        self.source_control = Some(source_control);
        self
    }

    pub fn progress(mut self, progress: Box<dyn CookProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Use this working set instead of walking the source directory
    pub fn source_files(mut self, source_files: SourceFiles) -> Self {
        self.source_files = Some(source_files);
        self
    }

    /// Leave cooked outputs alone when data versions changed (inspection runs)
    pub fn skip_version_processing(mut self) -> Self {
        self.process_versions = false;
        self
    }

    pub fn build(self) -> Result<Cooker> {
        self.settings.validate()?;

        let paths = ContentPaths::new(
            self.config.source_dir(),
            self.config.content_dir(),
            self.settings.platform,
        );
        validate_directories(&paths)?;

        let lock = CookerLock::acquire(paths.source_dir(), self.config.lock_timeout())?;

        let package = self
            .settings
            .package_config
            .as_deref()
            .map(PackageConfig::load)
            .transpose()?;

        let source_control: Box<dyn SourceControl> = match self.source_control {
            Some(scc) => scc,
            None => match &self.settings.perforce {
                Some(params) => {
                    info!("Using perforce client {} on {}", params.client_workspace, params.port);
                    Box::new(PerforceClient::new(params.clone()).with_timeout(self.config.process_timeout()))
                }
                None => Box::new(NullClient),
            },
        };

        let single_cook = self.settings.is_single_cook();
        let database: Box<dyn CookDatabase> = match self.database {
            Some(db) => db,
            None => {
                let db_path = self.config.database_path(self.settings.platform);
                let db = SqliteCookDatabase::open(&db_path, paths.clone())?;
                if self.process_versions && !single_cook {
                    let removed = db.process_one_to_one_versions()?;
                    if removed > 0 {
                        info!("Removed {} cooked file(s) with outdated versions", removed);
                    }
                }
                Box::new(db)
            }
        };

        let source_files = match self.source_files {
            Some(files) => files,
            None if single_cook => SourceFiles::new(),
            None => {
                let start = Instant::now();
                let files = SourceFiles::gather(paths.source_dir())?;
                debug!(
                    "Gathered {} source file(s) in {:.2}s",
                    files.len(),
                    start.elapsed().as_secs_f32()
                );
                files
            }
        };

        let mut tasks = self.tasks.unwrap_or_else(crate::tasks::default_registry);
        tasks.sort_by_key(|task| task.priority());

        let state = CookerState {
            settings: self.settings,
            paths,
            tools_dir: self.config.tools_dir(),
            database,
            source_control,
            progress: self.progress.unwrap_or_else(|| Box::new(LogProgress)),
            package,
            source_files,
            parallelism: self.config.parallelism(),
            process_timeout: self.config.process_timeout(),
        };

        Ok(Cooker {
            state,
            tasks,
            _lock: lock,
        })
    }
}

fn validate_directories(paths: &ContentPaths) -> Result<()> {
    if !paths.source_dir().is_dir() {
        return Err(Error::Environment(format!(
            "source directory {} does not exist",
            paths.source_dir().display()
        )));
    }

    let content_dir = paths.platform_content_dir();
    fs::create_dir_all(&content_dir).map_err(|e| {
        Error::Environment(format!(
            "cannot create content directory {}: {}",
            content_dir.display(),
            e
        ))
    })?;
    tempfile::tempfile_in(&content_dir).map_err(|e| {
        Error::Environment(format!(
            "content directory {} is not writable: {}",
            content_dir.display(),
            e
        ))
    })?;
    Ok(())
}

/// One cook run
pub struct Cooker {
    state: CookerState,
    tasks: Vec<Box<dyn CookTask>>,
    // Released last
    _lock: CookerLock,
}

impl Cooker {
    pub fn builder(config: CookerConfig, settings: CookerSettings) -> CookerBuilder {
        CookerBuilder::new(config, settings)
    }

    /// Tasks in the order they run
    pub fn tasks(&self) -> &[Box<dyn CookTask>] {
        &self.tasks
    }

    pub fn context(&self) -> &dyn CookContext {
        &self.state
    }

    pub fn state(&self) -> &CookerState {
        &self.state
    }

    /// Cook the configured single file, or everything out of date
    pub fn run(&mut self) -> Result<()> {
        match self.state.settings.single_cook_path.clone() {
            Some(path) => self.cook_single(&path),
            None => self.cook_all_out_of_date_content(),
        }
    }

    /// Run every stage in priority order, stopping at the first failure
    ///
    /// Every task's environment is validated before any task cooks.
    pub fn cook_all_out_of_date_content(&mut self) -> Result<()> {
        let start = Instant::now();

        for task in &self.tasks {
            if let Err(e) = task.validate_content_environment(&self.state) {
                error!("{}: content environment check failed: {}", task.name(), e);
                return Err(e);
            }
        }

        self.sync_generated_content()?;

        for task in &self.tasks {
            let stage_start = Instant::now();
            debug!("Running {} (priority {})", task.name(), task.priority());
            if let Err(e) = task.cook_all_out_of_date(&mut self.state) {
                error!("{} failed: {}", task.name(), e);
                return Err(e);
            }
            debug!(
                "{} finished in {:.2}s",
                task.name(),
                stage_start.elapsed().as_secs_f32()
            );
        }

        info!(
            "Cooked all out of date {} content in {:.2}s",
            self.state.platform(),
            start.elapsed().as_secs_f32()
        );
        Ok(())
    }

    /// Cook one file with the one task that claims it
    pub fn cook_single(&mut self, path: &FilePath) -> Result<()> {
        let claimants: Vec<&dyn CookTask> = self
            .tasks
            .iter()
            .map(|task| task.as_ref())
            .filter(|task| task.can_cook(path))
            .collect();

        let task = match claimants.as_slice() {
            [] => return Err(Error::NoTaskForFile(path.to_string())),
            [task] => *task,
            many => {
                return Err(Error::AmbiguousTask {
                    file: path.to_string(),
                    tasks: many.iter().map(|t| t.name().to_string()).collect(),
                });
            }
        };

        task.validate_content_environment(&self.state)?;
        info!("Cooking {} with {}", path, task.name());
        task.cook_single(&mut self.state, path).inspect_err(|e| {
            error!("{}: failed to cook {}: {}", task.name(), path, e);
        })
    }

    /// Stale files of every cookable type, or only of `only`
    pub fn status(&self, only: Option<FileType>) -> Result<Vec<StaleEntry>> {
        let mut stale = Vec::new();
        let paths = self.state.paths();
        let db = self.state.database();

        for file_type in FileType::COOKABLE {
            if only.is_some_and(|t| t != file_type) {
                continue;
            }
            for path in self.state.source_files_of_type(file_type) {
                if paths.is_excluded(path) {
                    continue;
                }
                let path = path.with_type(file_type);
                if let Freshness::Stale { changed } = db.check_up_to_date_with_details(&path)? {
                    stale.push(StaleEntry { path, changed });
                }
            }
        }
        Ok(stale)
    }

    fn sync_generated_content(&self) -> Result<()> {
        if self.state.settings.local || self.state.source_control.is_null() {
            return Ok(());
        }
        let folder = format!("{}/...", self.state.paths.generated_source_dir().display());
        info!("Syncing {}", folder);
        self.state.source_control.sync(&[folder]).inspect_err(|e| {
            warn!("Failed syncing generated content: {}", e);
        })
    }
}
