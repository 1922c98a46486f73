//! Handing media to the outside world: the system browser, inline HTML
//! players, and files in the user's download directory.

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use directories::UserDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::constants;

pub fn embed_url(id: &str) -> String {
  constants().embed_url.replace("{id}", id)
}

fn escape_html(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// A standalone page with a `<video>` element playing `bytes` from a data URI.
pub fn player_page_html(title: &str, bytes: &[u8]) -> String {
  let title = escape_html(title);
  let encoded = BASE64.encode(bytes);
  format!(
    "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
     <body style=\"margin:0;background:#111\">\n\
     <video width=\"100%\" controls preload=\"metadata\">\n\
     <source src=\"data:video/mp4;base64,{encoded}\" type=\"video/mp4\">\n\
     Your browser does not support the video tag.\n\
     </video>\n</body></html>\n"
  )
}

/// A generated player page on disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct PlayerPage {
  path: PathBuf,
}

impl PlayerPage {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for PlayerPage {
  fn drop(&mut self) {
    match std::fs::remove_file(&self.path) {
      Ok(()) => debug!(path = %self.path.display(), "media: player page removed"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => debug!(path = %self.path.display(), err = %e, "media: could not remove player page"),
    }
  }
}

/// Write the inline player page for a downloaded video into `dir`.
pub fn write_player_page(dir: &Path, video_id: &str, title: &str, bytes: &[u8]) -> Result<PlayerPage> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
  let path = dir.join(format!("ytsp-player-{video_id}.html"));
  std::fs::write(&path, player_page_html(title, bytes))
    .with_context(|| format!("Failed to write player page {}", path.display()))?;
  info!(path = %path.display(), "media: player page written");
  Ok(PlayerPage { path })
}

/// Where saved downloads go when the user configured nothing.
pub fn default_download_dir() -> PathBuf {
  UserDirs::new()
    .and_then(|d| d.download_dir().map(Path::to_path_buf))
    .or_else(|| std::env::current_dir().ok())
    .unwrap_or_else(|| PathBuf::from("."))
}

/// `<first N chars of title>.mp4`, with path-hostile characters replaced.
pub fn download_file_name(title: &str) -> String {
  let stem: String = title
    .chars()
    .take(constants().download_title_chars)
    .map(|c| if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
    .collect();
  let stem = stem.trim().trim_matches('.');
  if stem.is_empty() { "video.mp4".to_string() } else { format!("{stem}.mp4") }
}

/// Save downloaded bytes into `dir` and return the written path.
pub fn save_download(dir: &Path, title: &str, bytes: &[u8]) -> Result<PathBuf> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
  let path = dir.join(download_file_name(title));
  std::fs::write(&path, bytes).with_context(|| format!("Failed to save video to {}", path.display()))?;
  info!(path = %path.display(), bytes = bytes.len(), "media: download saved");
  Ok(path)
}

/// Open a URL or file in the platform's default handler.
pub fn open_in_browser(target: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";

  let mut child = std::process::Command::new(cmd)
    .arg(target)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {cmd}"))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}
