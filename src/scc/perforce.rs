// src/scc/perforce.rs

//! Perforce client driven through the `p4` command line

use super::{FileTypeOptions, SourceControl};
use crate::cook::process::{ProcessOptions, run_command_line_process};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Files per `p4` invocation, keeps command lines below OS limits
const MAX_FILES_PER_COMMAND: usize = 64;

/// Connection and changelist for cooker-side depot operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerforceParams {
    pub changelist: u32,
    pub client_workspace: String,
    pub port: String,
    pub user: String,
}

impl PerforceParams {
    pub fn is_valid(&self) -> bool {
        self.changelist > 0
            && !self.client_workspace.is_empty()
            && !self.port.is_empty()
            && !self.user.is_empty()
    }
}

pub struct PerforceClient {
    params: PerforceParams,
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl PerforceClient {
    pub fn new(params: PerforceParams) -> Self {
        let executable = which::which("p4").unwrap_or_else(|_| PathBuf::from("p4"));
        Self {
            params,
            executable,
            timeout: None,
        }
    }

    /// Use a specific `p4` binary
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn global_args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.params.client_workspace.clone(),
            "-p".to_string(),
            self.params.port.clone(),
            "-u".to_string(),
            self.params.user.clone(),
        ]
    }

    /// Run `p4 <command> <command_args> <chunk...>` for every chunk of `targets`
    fn run_chunked(&self, command: &str, command_args: &[String], targets: &[String]) -> Result<()> {
        let mut failed = Vec::new();
        for chunk in targets.chunks(MAX_FILES_PER_COMMAND) {
            let mut args = self.global_args();
            args.push(command.to_string());
            args.extend(command_args.iter().cloned());
            args.extend(chunk.iter().cloned());

            let options = ProcessOptions::default().with_timeout(self.timeout);
            match run_command_line_process(None, &self.executable, &args, &options) {
                Ok(output) => {
                    // p4 reports per-file problems on stderr with a zero exit code
                    for line in output.stderr.lines().filter(|l| !is_benign(l)) {
                        warn!("p4 {}: {}", command, line);
                        failed.push(line.to_string());
                    }
                }
                Err(e) => {
                    warn!("p4 {} failed: {}", command, e);
                    failed.extend(chunk.iter().cloned());
                }
            }
        }

        if failed.is_empty() {
            debug!("p4 {} succeeded for {} target(s)", command, targets.len());
            Ok(())
        } else {
            Err(Error::SourceControl(format!(
                "p4 {} failed for {} target(s): {}",
                command,
                failed.len(),
                failed.join(", ")
            )))
        }
    }

    fn changelist_args(&self) -> Vec<String> {
        vec!["-c".to_string(), self.params.changelist.to_string()]
    }
}

fn is_benign(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.ends_with("file(s) up-to-date.")
        || line.ends_with("file(s) not opened on this client.")
        || line.contains("currently opened for")
}

fn to_targets(files: &[PathBuf]) -> Vec<String> {
    files.iter().map(|p| path_arg(p)).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl SourceControl for PerforceClient {
    fn open_for_edit(&self, files: &[PathBuf], options: &FileTypeOptions) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = self.changelist_args();
        args.extend(["-t".to_string(), options.to_string()]);
        self.run_chunked("edit", &args, &to_targets(files))
    }

    fn open_for_add(&self, files: &[PathBuf], options: &FileTypeOptions) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = self.changelist_args();
        args.extend(["-t".to_string(), options.to_string()]);
        self.run_chunked("add", &args, &to_targets(files))
    }

    fn open_for_delete(&self, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        self.run_chunked("delete", &self.changelist_args(), &to_targets(files))
    }

    fn revert_unchanged(&self, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["-a".to_string()];
        args.extend(self.changelist_args());
        self.run_chunked("revert", &args, &to_targets(files))
    }

    fn sync(&self, specs: &[String]) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }
        self.run_chunked("sync", &[], specs)
    }
}
