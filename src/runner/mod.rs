//! Trigger for the external push service's main process.
//!
//! The process reads whatever the stores last wrote; the runner only starts
//! it, waits for it to exit and hands back the captured output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Errors starting the push process.
#[derive(Debug, Error)]
pub enum RunError {
    /// The working directory or the program does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The process could not be started or waited on.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub success: bool,
    /// stdout and stderr lines, in the order they arrived
    pub output: String,
    /// `None` when the process was killed by a signal
    pub return_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs a fixed command line in a fixed working directory.
#[derive(Debug, Clone)]
pub struct PushRunner {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
}

impl PushRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: workdir.into(),
        }
    }

    /// Build from a whitespace-separated command line. `None` if it is blank.
    pub fn from_command_line(command: &str, workdir: impl Into<PathBuf>) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), workdir))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Start the process and wait for it to exit.
    pub async fn run(&self) -> Result<RunOutput, RunError> {
        let workdir_exists = tokio::fs::try_exists(&self.workdir)
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !workdir_exists {
            return Err(RunError::NotFound {
                path: self.workdir.clone(),
            });
        }

        tracing::info!(
            program = %self.program,
            args = ?self.args,
            workdir = %self.workdir.display(),
            "Starting push process"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RunError::NotFound {
                    path: PathBuf::from(&self.program),
                },
                _ => self.spawn_error(e),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(self.spawn_error(std::io::Error::other("output pipes unavailable")));
        };
        let text = read_interleaved(stdout, stderr)
            .await
            .map_err(|e| self.spawn_error(e))?;
        let status = child.wait().await.map_err(|e| self.spawn_error(e))?;

        let return_code = status.code();
        tracing::info!(?return_code, "Push process finished");

        let error = match return_code {
            Some(0) => None,
            Some(code) => Some(format!("process exited with code {}", code)),
            None => Some("process terminated by signal".to_string()),
        };

        Ok(RunOutput {
            success: status.success(),
            output: trim_lines(&text),
            return_code,
            error,
        })
    }

    fn spawn_error(&self, source: std::io::Error) -> RunError {
        RunError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

/// Read both pipes to the end, keeping lines in the order they arrive.
async fn read_interleaved(
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin,
) -> std::io::Result<String> {
    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let (mut out_done, mut err_done) = (false, false);
    let mut lines = Vec::new();

    while !out_done || !err_done {
        tokio::select! {
            segment = out.next_segment(), if !out_done => match segment? {
                Some(line) => lines.push(String::from_utf8_lossy(&line).into_owned()),
                None => out_done = true,
            },
            segment = err.next_segment(), if !err_done => match segment? {
                Some(line) => lines.push(String::from_utf8_lossy(&line).into_owned()),
                None => err_done = true,
            },
        }
    }

    Ok(lines.join("\n"))
}

/// Strip trailing whitespace from every line and drop trailing blank lines.
fn trim_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str, workdir: &Path) -> PushRunner {
        PushRunner::new("sh", vec!["-c".to_string(), script.to_string()], workdir)
    }

    #[test]
    fn test_from_command_line() {
        let runner = PushRunner::from_command_line("python3  main.py --once", ".").unwrap();
        assert_eq!(runner.program(), "python3");
        assert_eq!(runner.args, vec!["main.py", "--once"]);
        assert!(PushRunner::from_command_line("   ", ".").is_none());
    }

    #[test]
    fn test_trim_lines() {
        assert_eq!(trim_lines("a  \nb\t\n\n"), "a\nb");
        assert_eq!(trim_lines(""), "");
    }

    #[tokio::test]
    async fn test_run_success_captures_output() {
        let dir = TempDir::new().unwrap();
        let runner = shell("echo fetched 3 items; echo warn >&2", dir.path());

        let out = runner.run().await.unwrap();

        assert!(out.success);
        assert_eq!(out.return_code, Some(0));
        assert_eq!(out.output, "fetched 3 items\nwarn");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn test_run_keeps_arrival_order() {
        let dir = TempDir::new().unwrap();
        let runner = shell(
            "echo first; sleep 0.2; echo second >&2; sleep 0.2; echo third",
            dir.path(),
        );

        let out = runner.run().await.unwrap();
        assert_eq!(out.output, "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn test_run_uses_workdir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let out = shell("cat marker.txt", dir.path()).run().await.unwrap();
        assert_eq!(out.output, "here");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let out = shell("echo failing; exit 3", dir.path()).run().await.unwrap();

        assert!(!out.success);
        assert_eq!(out.return_code, Some(3));
        assert_eq!(out.error.as_deref(), Some("process exited with code 3"));
        assert_eq!(out.output, "failing");
    }

    #[tokio::test]
    async fn test_missing_workdir() {
        let dir = TempDir::new().unwrap();
        let runner = shell("true", &dir.path().join("gone"));

        let err = runner.run().await.unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_workdir_check_failure_is_spawn_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "not a directory").unwrap();

        // A path below a regular file cannot be checked at all.
        let err = shell("true", &file.join("sub")).run().await.unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let runner = PushRunner::new("definitely-not-a-real-program-xyz", vec![], dir.path());

        let err = runner.run().await.unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }
}
