// src/cook/process.rs

//! External converter invocation

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// How a converter's output is judged
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Any output on stderr fails the run even with a zero exit code
    pub treat_stderr_as_failure: bool,
    /// Stdout lines count as error output
    pub treat_stdout_as_errors: bool,
    /// Kill the process if it runs longer than this
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    pub fn strict() -> Self {
        Self {
            treat_stderr_as_failure: true,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured output of a successful run
#[derive(Debug, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` to completion and judge it per `options`
///
/// Both pipes are drained on helper threads so a chatty converter can never
/// block on a full pipe.
pub fn run_command_line_process<S: AsRef<OsStr>>(
    working_dir: Option<&Path>,
    command: &Path,
    args: &[S],
    options: &ProcessOptions,
) -> Result<ProcessOutput> {
    let name = command.display().to_string();
    let fail = |reason: String| Error::Process {
        command: name.clone(),
        reason,
    };

    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    debug!("Executing: {} {:?}", name, args.iter().map(|a| a.as_ref()).collect::<Vec<_>>());
    let mut child = cmd.spawn().map_err(|e| fail(format!("failed to start: {}", e)))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match options.timeout {
        Some(timeout) => match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(fail(format!("timed out after {} seconds", timeout.as_secs())));
            }
        },
        None => child.wait()?,
    };

    let stdout = stdout.map(join).unwrap_or_default();
    let stderr = stderr.map(join).unwrap_or_default();

    for line in stdout.lines() {
        debug!("[{}] {}", name, line);
    }
    for line in stderr.lines() {
        warn!("[{}] {}", name, line);
    }

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        return Err(fail(format!("exit code {}: {}", code, error_text(&stdout, &stderr, options))));
    }

    let has_error_output =
        !stderr.trim().is_empty() || (options.treat_stdout_as_errors && !stdout.trim().is_empty());
    if options.treat_stderr_as_failure && has_error_output {
        return Err(fail(format!(
            "reported errors: {}",
            error_text(&stdout, &stderr, options)
        )));
    }

    Ok(ProcessOutput { stdout, stderr })
}

fn error_text(stdout: &str, stderr: &str, options: &ProcessOptions) -> String {
    let mut text = stderr.trim().to_string();
    if options.treat_stdout_as_errors && !stdout.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stdout.trim());
    }
    text
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
