use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single extraction-tool invocation.
///
/// Every service in `youtube` and `tool` reports through this type; the app turns it
/// into a status-line message and never propagates it further.
#[derive(Debug, Error)]
pub enum ToolError {
  /// The tool could not be started at all (missing binary, permissions).
  #[error("yt-dlp is not available: {0}")]
  Unavailable(String),

  #[error("yt-dlp timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  /// The tool ran but exited unsuccessfully.
  #[error("yt-dlp exited with {status}: {stderr}")]
  Failed { status: ExitStatus, stderr: String },

  /// Output could not be decoded into the expected shape.
  #[error("could not parse yt-dlp output: {0}")]
  Parse(String),

  /// The tool exited successfully but produced nothing usable.
  #[error("yt-dlp produced no {0}")]
  MissingOutput(&'static str),

  /// Local file handling around the invocation failed (temporary download files).
  #[error("temporary file error: {0}")]
  Io(#[from] std::io::Error),
}

impl ToolError {
  /// Short label for the status line.
  pub fn kind(&self) -> &'static str {
    match self {
      ToolError::Unavailable(_) => "tool unavailable",
      ToolError::Timeout(_) => "timed out",
      ToolError::Failed { .. } => "tool failed",
      ToolError::Parse(_) => "unreadable output",
      ToolError::MissingOutput(_) => "no output",
      ToolError::Io(_) => "file error",
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, ToolError::Timeout(_))
  }
}

impl From<serde_json::Error> for ToolError {
  fn from(e: serde_json::Error) -> Self {
    ToolError::Parse(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timeout_message_reports_seconds() {
    let err = ToolError::Timeout(Duration::from_secs(30));
    assert_eq!(err.to_string(), "yt-dlp timed out after 30s");
    assert!(err.is_timeout());
    assert_eq!(err.kind(), "timed out");
  }

  #[test]
  fn json_errors_become_parse_failures() {
    let err: ToolError = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err().into();
    assert!(matches!(err, ToolError::Parse(_)));
    assert!(!err.is_timeout());
  }

  #[test]
  fn missing_output_names_what_was_missing() {
    let err = ToolError::MissingOutput("stream URL");
    assert_eq!(err.to_string(), "yt-dlp produced no stream URL");
  }
}
