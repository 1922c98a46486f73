//! Typed quality tiers and the yt-dlp format selectors built from them.

use clap::ValueEnum;

use crate::constants::constants;

/// Container the selectors prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
  Mp4,
  M4a,
}

impl Container {
  pub fn ext(self) -> &'static str {
    match self {
      Container::Mp4 => "mp4",
      Container::M4a => "m4a",
    }
  }
}

/// Vertical-resolution ceiling offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Quality {
  #[value(name = "1080p")]
  P1080,
  #[default]
  #[value(name = "720p")]
  P720,
  #[value(name = "480p")]
  P480,
  #[value(name = "360p")]
  P360,
  #[value(name = "240p")]
  P240,
}

impl Quality {
  pub const ALL: [Quality; 5] = [Quality::P1080, Quality::P720, Quality::P480, Quality::P360, Quality::P240];

  pub fn label(self) -> &'static str {
    match self {
      Quality::P1080 => "1080p",
      Quality::P720 => "720p",
      Quality::P480 => "480p",
      Quality::P360 => "360p",
      Quality::P240 => "240p",
    }
  }

  pub fn from_config(s: &str) -> Self {
    Self::ALL.into_iter().find(|q| q.label().eq_ignore_ascii_case(s.trim())).unwrap_or_default()
  }

  pub fn max_height(self) -> u32 {
    match self {
      Quality::P1080 => 1080,
      Quality::P720 => 720,
      Quality::P480 => 480,
      Quality::P360 => 360,
      Quality::P240 => 240,
    }
  }

  pub fn tier(self) -> QualityTier {
    QualityTier { max_height: self.max_height(), container: Container::Mp4 }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|q| *q == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }
}

/// Height ceiling plus preferred container for stream resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityTier {
  pub max_height: u32,
  pub container: Container,
}

impl QualityTier {
  /// Best encoding under the ceiling in the preferred container, then best in
  /// that container, then absolute best.
  pub fn stream_selector(&self) -> String {
    let ext = self.container.ext();
    format!("best[height<={}][ext={ext}]/best[ext={ext}]/best", self.max_height)
  }
}

/// Audio-only stream, preferring m4a.
pub fn audio_selector() -> String {
  let ext = Container::M4a.ext();
  format!("bestaudio[ext={ext}]/bestaudio/best")
}

/// Upper bound on a single download, in megabytes.
///
/// Only the sizes offered in `constants.ron` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCap(u32);

impl Default for SizeCap {
  fn default() -> Self {
    SizeCap(constants().max_size_default_mb)
  }
}

impl SizeCap {
  pub fn new(mb: u32) -> Option<Self> {
    constants().max_size_choices_mb.contains(&mb).then_some(SizeCap(mb))
  }

  pub fn mb(self) -> u32 {
    self.0
  }

  pub fn next(self) -> Self {
    let choices = &constants().max_size_choices_mb;
    let idx = choices.iter().position(|c| *c == self.0).unwrap_or(0);
    choices.get((idx + 1) % choices.len()).copied().map(SizeCap).unwrap_or_default()
  }

  /// Best encoding under the cap in `container`, else the smallest in it.
  pub fn download_selector(self, container: Container) -> String {
    let ext = container.ext();
    format!("best[filesize<{}M][ext={ext}]/worst[ext={ext}]", self.0)
  }
}
