use serde::Deserialize;
use serde_json::Value;

use crate::constants::constants;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_UPLOADER: &str = "Unknown Channel";

/// Core metadata of one video, independent of how it was obtained.
///
/// `url` and `thumbnail` are always derived from `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
  pub id: String,
  pub title: String,
  pub uploader: String,
  pub duration: Option<u64>,
  pub view_count: Option<u64>,
  pub url: String,
  pub thumbnail: String,
}

impl VideoRecord {
  /// A record known only by id (e.g. loaded from a pasted URL).
  pub fn from_id(id: &str) -> Self {
    Self {
      id: id.to_string(),
      title: UNKNOWN_TITLE.to_string(),
      uploader: UNKNOWN_UPLOADER.to_string(),
      duration: None,
      view_count: None,
      url: watch_url(id),
      thumbnail: thumbnail_url(id),
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = title.into();
    self
  }

  pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
    self.uploader = uploader.into();
    self
  }

  pub fn with_duration(mut self, seconds: Option<u64>) -> Self {
    self.duration = seconds;
    self
  }

  pub fn with_view_count(mut self, views: Option<u64>) -> Self {
    self.view_count = views;
    self
  }
}

/// A [`VideoRecord`] plus the extra fields of a full metadata dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedVideoRecord {
  pub video: VideoRecord,
  /// At most `description_max_chars` characters, `...` appended when cut.
  pub description: String,
  /// Raw `upload_date` token as yt-dlp reports it (YYYYMMDD), not reinterpreted.
  pub upload_date: String,
  pub formats_available: usize,
}

pub fn watch_url(id: &str) -> String {
  constants().watch_url.replace("{id}", id)
}

pub fn thumbnail_url(id: &str) -> String {
  constants().thumbnail_url.replace("{id}", id)
}

/// The subset of a yt-dlp info JSON object we read. Every field is optional;
/// flat-playlist entries carry far less than a full dump.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawInfo {
  pub id: Option<String>,
  pub title: Option<String>,
  pub uploader: Option<String>,
  pub channel: Option<String>,
  pub duration: Option<Value>,
  pub view_count: Option<Value>,
  pub description: Option<String>,
  pub upload_date: Option<String>,
  pub formats: Option<Vec<Value>>,
}

impl RawInfo {
  /// Map into a record, applying the placeholder defaults.
  /// Returns `None` when the entry has no usable id.
  pub(crate) fn into_record(self, fallback_id: Option<&str>) -> Option<VideoRecord> {
    let id = self.id.filter(|s| !s.trim().is_empty()).or_else(|| fallback_id.map(str::to_string))?;
    let title = non_empty(self.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let uploader =
      non_empty(self.uploader).or_else(|| non_empty(self.channel)).unwrap_or_else(|| UNKNOWN_UPLOADER.to_string());
    Some(
      VideoRecord::from_id(&id)
        .with_title(title)
        .with_uploader(uploader)
        .with_duration(self.duration.as_ref().and_then(json_seconds))
        .with_view_count(self.view_count.as_ref().and_then(json_seconds)),
    )
  }
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Read a non-negative count from JSON. Floats are floored; anything
/// non-numeric, negative or non-finite is absent.
pub fn json_seconds(value: &Value) -> Option<u64> {
  if let Some(n) = value.as_u64() {
    return Some(n);
  }
  value.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.floor() as u64)
}

/// Render seconds as `M:SS`. There is no hour field; minutes grow unbounded.
pub fn format_duration(seconds: Option<u64>) -> String {
  match seconds {
    Some(s) => format!("{}:{:02}", s / 60, s % 60),
    None => "Unknown".to_string(),
  }
}

/// `1234567` → `1,234,567`
pub fn format_count(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// Cap a description at `max_chars` characters, appending `...` only when cut.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
  match text.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    None => text.to_string(),
  }
}
