//! Invocation of the external extraction tool (yt-dlp).
//!
//! Every call runs under a hard timeout and with `kill_on_drop`, so a hung tool is
//! killed when its deadline passes. Failures are reported as [`ToolError`] kinds.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::constants::constants;
use crate::error::ToolError;

/// How to start the extraction tool, plus where it may write scratch files.
#[derive(Debug, Clone)]
pub struct Tool {
  program: String,
  leading_args: Vec<String>,
  scratch_dir: PathBuf,
}

impl Default for Tool {
  fn default() -> Self {
    Self::new(constants().tool_program.clone())
  }
}

impl Tool {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into(), leading_args: Vec::new(), scratch_dir: std::env::temp_dir() }
  }

  /// Parse a user-supplied command line such as `python3 -m yt_dlp`.
  /// Returns `None` for a blank command.
  pub fn from_command_line(cmd: &str) -> Option<Self> {
    let mut parts = cmd.split_whitespace();
    let program = parts.next()?;
    Some(Self::new(program).with_args(parts))
  }

  /// Arguments placed before every invocation's own arguments.
  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.leading_args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Directory in which per-download temporary directories are created.
  pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.scratch_dir = dir.into();
    self
  }

  pub fn scratch_dir(&self) -> &Path {
    &self.scratch_dir
  }

  /// The command line as the user would type it.
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str()).chain(self.leading_args.iter().map(String::as_str)).collect::<Vec<_>>().join(" ")
  }

  /// Run the tool with `args`, capturing stdout and stderr.
  ///
  /// Returns the output only when the process exits with status 0 before `timeout`.
  pub async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, ToolError> {
    let started = Instant::now();
    debug!(tool = %self.program, ?args, "tool: invoking");

    let child = Command::new(&self.program)
      .args(&self.leading_args)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
          ToolError::Unavailable(format!("{} not found. Install it with: pip install yt-dlp", self.program))
        } else {
          ToolError::Unavailable(format!("failed to start {}: {}", self.program, e))
        }
      })?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
      Ok(Ok(output)) => output,
      Ok(Err(e)) => return Err(ToolError::Unavailable(format!("failed to wait for {}: {}", self.program, e))),
      Err(_) => {
        warn!(tool = %self.program, ?args, secs = timeout.as_secs_f32(), "tool: timed out");
        return Err(ToolError::Timeout(timeout));
      }
    };

    debug!(status = %output.status, elapsed_ms = started.elapsed().as_millis() as u64, "tool: finished");

    if !output.status.success() {
      let stderr = summarize_stderr(&output.stderr);
      warn!(status = %output.status, stderr = %stderr, "tool: non-zero exit");
      return Err(ToolError::Failed { status: output.status, stderr });
    }
    Ok(output)
  }

  /// Query the tool version (`--version`), bounded by the probe timeout.
  /// A tool that exits 0 without printing a version reports `unknown`.
  pub async fn version(&self) -> Result<String, ToolError> {
    let output = self.run(&["--version"], constants().probe_timeout()).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("unknown").to_string())
  }

  /// Whether `--version` exits with status 0 in time.
  pub async fn is_available(&self) -> bool {
    self.run(&["--version"], constants().probe_timeout()).await.is_ok()
  }
}

/// Reduce yt-dlp stderr to the line worth showing: the last non-empty one,
/// which is where it prints `ERROR: ...`.
fn summarize_stderr(stderr: &[u8]) -> String {
  let text = String::from_utf8_lossy(stderr);
  text.lines().map(str::trim).rfind(|l| !l.is_empty()).unwrap_or("no error output").to_string()
}
