use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User preferences persisted to `prefs.toml` between runs.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub quality: Option<String>,
  pub processing_mode: Option<String>,
  pub max_results: Option<usize>,
  pub max_size_mb: Option<u32>,
  /// Command used to run the extraction tool, e.g. `python3 -m yt_dlp`.
  pub tool: Option<String>,
  pub download_dir: Option<PathBuf>,
  /// Where per-download temporary directories are created (default: system temp).
  pub scratch_dir: Option<PathBuf>,
}

impl Config {
  fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ytsp").map(|d| d.config_dir().join("prefs.toml"))
  }

  pub fn load() -> Self {
    if let Some(config_file) = Self::path()
      && let Ok(content) = std::fs::read_to_string(config_file)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(config_file) = Self::path()
      && let Some(config_dir) = config_file.parent()
      && std::fs::create_dir_all(config_dir).is_ok()
      && let Ok(content) = toml::to_string(self)
    {
      let _ = std::fs::write(config_file, content);
    }
  }
}
