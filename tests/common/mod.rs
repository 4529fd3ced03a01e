// tests/common/mod.rs

//! Shared fixtures for the cooker integration tests.
#![allow(dead_code)]

use cooker::cook::{CookContext, CookTask, atomic_write_final_output, batch};
use cooker::database::{CookDatabase, CookSource, Freshness};
use cooker::progress::SilentProgress;
use cooker::scc::{FileTypeOptions, SourceControl};
use cooker::{Cooker, CookerConfig, CookerSettings, Error, FilePath, FileType, Platform, Result};
use rand::Rng;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Shared, ordered event log written by test doubles
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A project tree in a temp directory: `Source/`, `Data/Content/`, `Tools/`
///
/// Keep it alive for the duration of the test.
pub struct ContentTree {
    pub temp: TempDir,
}

impl ContentTree {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Source")).unwrap();
        fs::create_dir_all(temp.path().join("Data/Content")).unwrap();
        fs::create_dir_all(temp.path().join("Tools")).unwrap();
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root().join("Source")
    }

    pub fn platform_content_dir(&self) -> PathBuf {
        self.root().join("Data/Content/PC")
    }

    pub fn config(&self) -> CookerConfig {
        let mut config = CookerConfig::with_base_dir(self.root());
        config.tools_dir = Some(PathBuf::from("Tools"));
        config.lock_timeout_secs = 5;
        config.jobs = 4;
        config
    }

    /// Write a source file and return its identity
    pub fn write_source(&self, relative: &str, contents: &str) -> FilePath {
        let path = self.source_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        FilePath::parse(relative).unwrap()
    }

    /// Pretend a converter is installed
    pub fn install_tool(&self, name: &str) {
        fs::write(self.root().join("Tools").join(name), "#!/bin/sh\n").unwrap();
    }

    pub fn cooked_path(&self, path: &FilePath) -> PathBuf {
        self.platform_content_dir().join(path.relative_cooked())
    }

    pub fn read_cooked(&self, path: &FilePath) -> Option<String> {
        fs::read_to_string(self.cooked_path(path)).ok()
    }

    /// Move a source file's modification time forward
    pub fn touch_source(&self, path: &FilePath, seconds_ahead: i64) {
        let source = self.source_dir().join(path.relative_source());
        let modified = filetime::FileTime::from_last_modification_time(&fs::metadata(&source).unwrap());
        let later = filetime::FileTime::from_unix_time(modified.unix_seconds() + seconds_ahead, 0);
        filetime::set_file_mtime(&source, later).unwrap();
    }
}

/// Build a full-cook cooker over `tree` with the given tasks and the default
/// SQLite database
pub fn build_cooker(tree: &ContentTree, tasks: Vec<Box<dyn CookTask>>) -> Cooker {
    Cooker::builder(tree.config(), CookerSettings::new(Platform::PC))
        .tasks(tasks)
        .progress(Box::new(SilentProgress))
        .build()
        .unwrap()
}

/// Like [`build_cooker`], with an in-memory database double
pub fn build_cooker_with_db(tree: &ContentTree, tasks: Vec<Box<dyn CookTask>>, db: &MemoryDatabase) -> Cooker {
    Cooker::builder(tree.config(), CookerSettings::new(Platform::PC))
        .tasks(tasks)
        .database(Box::new(db.clone()))
        .progress(Box::new(SilentProgress))
        .build()
        .unwrap()
}

#[derive(Default)]
pub struct MemoryState {
    pub fresh: HashSet<FilePath>,
    pub updates: Vec<(FilePath, Vec<CookSource>)>,
}

/// Database double: a file is fresh once marked or once its metadata was
/// updated
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    pub state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_fresh(&self, path: &FilePath) {
        self.state.lock().unwrap().fresh.insert(path.clone());
    }

    /// Files whose metadata was updated, in update order
    pub fn updated(&self) -> Vec<FilePath> {
        self.state.lock().unwrap().updates.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn sources_of(&self, path: &FilePath) -> Option<Vec<CookSource>> {
        self.state
            .lock()
            .unwrap()
            .updates
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, s)| s.clone())
    }
}

impl CookDatabase for MemoryDatabase {
    fn check_up_to_date(&self, path: &FilePath) -> Result<bool> {
        Ok(self.state.lock()?.fresh.contains(path))
    }

    fn check_up_to_date_with_details(&self, path: &FilePath) -> Result<Freshness> {
        if self.check_up_to_date(path)? {
            Ok(Freshness::UpToDate)
        } else {
            Ok(Freshness::Stale { changed: Vec::new() })
        }
    }

    fn update_metadata(&self, path: &FilePath, _cooked_timestamp: u64, sources: &[CookSource]) -> Result<()> {
        let mut state = self.state.lock()?;
        state.fresh.insert(path.clone());
        state.updates.push((path.clone(), sources.to_vec()));
        Ok(())
    }

    fn on_file_change(&self, path: &FilePath) {
        if let Ok(mut state) = self.state.lock() {
            state.fresh.remove(path);
        }
    }
}

/// Source-control double that records every operation as `op:path`
#[derive(Clone, Default)]
pub struct RecordingScc {
    pub log: EventLog,
}

impl RecordingScc {
    fn record(&self, op: &str, files: impl IntoIterator<Item = String>) {
        let mut log = self.log.lock().unwrap();
        for file in files {
            log.push(format!("{}:{}", op, file));
        }
    }
}

fn display_all(files: &[PathBuf]) -> Vec<String> {
    files.iter().map(|f| f.display().to_string()).collect()
}

impl SourceControl for RecordingScc {
    fn open_for_edit(&self, files: &[PathBuf], _options: &FileTypeOptions) -> Result<()> {
        self.record("edit", display_all(files));
        Ok(())
    }

    fn open_for_add(&self, files: &[PathBuf], _options: &FileTypeOptions) -> Result<()> {
        self.record("add", display_all(files));
        Ok(())
    }

    fn open_for_delete(&self, files: &[PathBuf]) -> Result<()> {
        self.record("delete", display_all(files));
        Ok(())
    }

    fn revert_unchanged(&self, files: &[PathBuf]) -> Result<()> {
        self.record("revert", display_all(files));
        Ok(())
    }

    fn sync(&self, specs: &[String]) -> Result<()> {
        self.record("sync", specs.iter().cloned());
        Ok(())
    }
}

/// Instrumented task cooking one type, or a range of types in groups
///
/// Cooked output is the literal `cooked <path>`. Events go to the shared log
/// as `<name>:validate` and `<name>:stage`.
#[derive(Clone)]
pub struct TestTask {
    pub name: String,
    pub priority: i32,
    pub first: FileType,
    pub last: FileType,
    pub parallel: bool,
    pub claims: bool,
    pub write_output: bool,
    pub fail: HashSet<String>,
    pub fail_environment: bool,
    pub max_latency_ms: u64,
    pub log: EventLog,
    pub cooks: Arc<Mutex<Vec<FilePath>>>,
    pub multi_calls: Arc<Mutex<Vec<Vec<FilePath>>>>,
}

impl TestTask {
    pub fn new(name: &str, priority: i32, file_type: FileType, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            priority,
            first: file_type,
            last: file_type,
            parallel: false,
            claims: true,
            write_output: true,
            fail: HashSet::new(),
            fail_environment: false,
            max_latency_ms: 0,
            log: Arc::clone(log),
            cooks: Arc::default(),
            multi_calls: Arc::default(),
        }
    }

    pub fn range(mut self, first: FileType, last: FileType) -> Self {
        self.first = first;
        self.last = last;
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn not_claiming(mut self) -> Self {
        self.claims = false;
        self
    }

    pub fn without_output(mut self) -> Self {
        self.write_output = false;
        self
    }

    /// Fail every cook of this extension-less relative path
    pub fn failing(mut self, relative: &str) -> Self {
        self.fail.insert(relative.to_string());
        self
    }

    pub fn failing_environment(mut self) -> Self {
        self.fail_environment = true;
        self
    }

    pub fn with_latency(mut self, max_ms: u64) -> Self {
        self.max_latency_ms = max_ms;
        self
    }

    pub fn boxed(&self) -> Box<dyn CookTask> {
        Box::new(self.clone())
    }

    pub fn cooked(&self) -> Vec<FilePath> {
        self.cooks.lock().unwrap().clone()
    }

    pub fn multi(&self) -> Vec<Vec<FilePath>> {
        self.multi_calls.lock().unwrap().clone()
    }

    fn event(&self, what: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, what));
    }
}

impl CookTask for TestTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_cook(&self, path: &FilePath) -> bool {
        self.claims && (self.first..=self.last).contains(&path.file_type())
    }

    fn cook_all_out_of_date(&self, ctx: &mut dyn CookContext) -> Result<()> {
        self.event("stage");
        if self.first == self.last {
            batch::default_out_of_date_cook(self, &*ctx, self.first, self.parallel)?;
        } else {
            batch::default_out_of_date_cook_multi(self, &*ctx, self.first, self.last, self.parallel)?;
        }
        Ok(())
    }

    fn validate_content_environment(&self, _ctx: &dyn CookContext) -> Result<()> {
        self.event("validate");
        if self.fail_environment {
            return Err(Error::Environment(format!("{} tool missing", self.name)));
        }
        Ok(())
    }

    fn internal_cook(&self, ctx: &dyn CookContext, path: &FilePath) -> Result<()> {
        if self.max_latency_ms > 0 {
            let ms = rand::thread_rng().gen_range(0..=self.max_latency_ms);
            thread::sleep(Duration::from_millis(ms));
        }
        self.cooks.lock()?.push(path.clone());

        if self.fail.contains(path.relative()) {
            return Err(Error::cook_failed(path, "injected failure"));
        }
        if self.write_output {
            atomic_write_final_output(&ctx.paths().cooked_path(path), format!("cooked {}", path).as_bytes())?;
        }
        Ok(())
    }

    fn internal_cook_multi(&self, ctx: &dyn CookContext, group: &[FilePath]) -> Result<()> {
        self.multi_calls.lock()?.push(group.to_vec());
        for path in group {
            self.internal_cook(ctx, path)?;
        }
        Ok(())
    }
}
