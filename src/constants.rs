//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// One entry of the offline demo catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoVideo {
  pub id: String,
  pub title: String,
  pub uploader: String,
  pub duration: u64,
}

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // yt-dlp
  pub tool_program: String,
  pub search_provider: String,

  // Timeouts
  pub probe_timeout_secs: u64,
  pub query_timeout_secs: u64,
  pub download_timeout_secs: u64,

  pub description_max_chars: usize,
  pub download_title_chars: usize,
  pub error_display_secs: u64,

  // Settings choices
  pub max_results_default: usize,
  pub max_results_choices: Vec<usize>,
  pub max_size_default_mb: u32,
  pub max_size_choices_mb: Vec<u32>,

  // URL templates, `{id}` is substituted
  pub watch_url: String,
  pub thumbnail_url: String,
  pub embed_url: String,

  pub demo_catalog: Vec<DemoVideo>,
  pub quick_categories: Vec<String>,
  pub popular_searches: Vec<String>,
}

impl Constants {
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_secs)
  }

  /// Timeout for search, metadata and stream-URL queries.
  pub fn query_timeout(&self) -> Duration {
    Duration::from_secs(self.query_timeout_secs)
  }

  pub fn download_timeout(&self) -> Duration {
    Duration::from_secs(self.download_timeout_secs)
  }

  /// Quick categories followed by popular searches, in display order.
  pub fn suggestions(&self) -> impl Iterator<Item = &str> {
    self.quick_categories.iter().chain(&self.popular_searches).map(String::as_str)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
