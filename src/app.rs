use anyhow::{Context, Result};
use ratatui::widgets::ListState;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::error::ToolError;
use crate::format::{Quality, SizeCap};
use crate::media;
use crate::player::{NowPlaying, Player};
use crate::session::SessionState;
use crate::theme::THEMES;
use crate::tool::Tool;
use crate::url;
use crate::video::{DetailedVideoRecord, VideoRecord};
use crate::youtube::{self, SearchOutcome};

/// How a selected video is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProcessingMode {
  /// Resolve a direct stream URL for mpv or the browser.
  Stream,
  /// Download a size-capped file into memory.
  Download,
  /// Resolve the audio stream and play it with mpv.
  #[value(name = "audio")]
  AudioOnly,
  /// YouTube's own embed player; needs no yt-dlp.
  Embed,
}

impl ProcessingMode {
  pub const ALL: [ProcessingMode; 4] =
    [ProcessingMode::Stream, ProcessingMode::Download, ProcessingMode::AudioOnly, ProcessingMode::Embed];

  pub fn label(self) -> &'static str {
    match self {
      ProcessingMode::Stream => "stream",
      ProcessingMode::Download => "download",
      ProcessingMode::AudioOnly => "audio",
      ProcessingMode::Embed => "embed",
    }
  }

  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "download" => ProcessingMode::Download,
      "audio" => ProcessingMode::AudioOnly,
      "embed" => ProcessingMode::Embed,
      _ => ProcessingMode::Stream,
    }
  }

  pub fn needs_tool(self) -> bool {
    self != ProcessingMode::Embed
  }

  /// Label of the process action in this mode.
  pub fn action(self) -> &'static str {
    match self {
      ProcessingMode::Stream => "Get stream URL",
      ProcessingMode::Download => "Download",
      ProcessingMode::AudioOnly => "Play audio",
      ProcessingMode::Embed => "Embed",
    }
  }
}

/// User-adjustable settings (sidebar).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
  pub quality: Quality,
  pub mode: ProcessingMode,
  pub max_results: usize,
  pub size_cap: SizeCap,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      quality: Quality::default(),
      mode: ProcessingMode::Stream,
      max_results: constants().max_results_default,
      size_cap: SizeCap::default(),
    }
  }
}

impl Settings {
  /// Settings from persisted preferences; out-of-range values fall back to defaults.
  pub fn from_config(config: &Config) -> Self {
    let defaults = Self::default();
    Self {
      quality: config.quality.as_deref().map_or(defaults.quality, Quality::from_config),
      mode: config.processing_mode.as_deref().map_or(defaults.mode, ProcessingMode::from_config),
      max_results: config
        .max_results
        .filter(|n| constants().max_results_choices.contains(n))
        .unwrap_or(defaults.max_results),
      size_cap: config.max_size_mb.and_then(SizeCap::new).unwrap_or(defaults.size_cap),
    }
  }
}

/// Result of the startup availability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
  #[default]
  Checking,
  Available(String),
  Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
  Video,
}

/// Which kind of text the input box takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTab {
  Search,
  Url,
}

/// Completed background work, applied to the session on the UI task.
/// Per-video outcomes carry the selection generation they were started under.
pub enum TaskOutcome {
  Probe(ToolStatus),
  Search { query: String, result: Result<SearchOutcome, ToolError> },
  Info { video_id: String, generation: u64, result: Result<DetailedVideoRecord, ToolError> },
  Stream { video_id: String, generation: u64, result: Result<String, ToolError> },
  Audio { video_id: String, generation: u64, title: String, result: Result<String, ToolError> },
  Download { video_id: String, generation: u64, result: Result<Vec<u8>, ToolError> },
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub input_tab: InputTab,
  pub mode: AppMode,
  pub theme_index: usize,
  pub settings: Settings,
  pub session: SessionState,
  pub list_state: ListState,
  pub player: Player,
  pub tool: Tool,
  pub tool_status: ToolStatus,
  pub download_dir: PathBuf,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// At most one tool invocation is in flight.
  pending: Option<oneshot::Receiver<TaskOutcome>>,
  suggestion_idx: usize,
  config: Config,
  persist_config: bool,
  error_time: Option<Instant>,
  /// Player pages for downloaded videos; removed with the app.
  page_dir: Option<tempfile::TempDir>,
}

impl App {
  pub fn new(config: Config, settings: Settings, tool: Tool) -> Self {
    let theme_index =
      config.theme_name.as_deref().and_then(|name| THEMES.iter().position(|t| t.name == name)).unwrap_or(0);
    let download_dir = config.download_dir.clone().unwrap_or_else(media::default_download_dir);

    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      input_tab: InputTab::Search,
      mode: AppMode::Input,
      theme_index,
      settings,
      session: SessionState::new(),
      list_state: ListState::default(),
      player: Player::new(),
      tool,
      tool_status: ToolStatus::Checking,
      download_dir,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      pending: None,
      suggestion_idx: 0,
      config,
      persist_config: true,
      error_time: None,
      page_dir: None,
    }
  }

  /// App that never touches the user's preferences or a real yt-dlp.
  #[cfg(test)]
  pub(crate) fn for_tests() -> Self {
    let mut app = App::new(Config::default(), Settings::default(), Tool::new("ytsp-test-no-such-tool"));
    app.persist_config = false;
    app.download_dir = std::env::temp_dir();
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    warn!(err = %msg, "app: error shown");
    self.last_error = Some(msg);
    self.info_message = None;
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after a few seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_display_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  fn set_info(&mut self, msg: impl Into<String>) {
    self.info_message = Some(msg.into());
  }

  fn save_config(&mut self) {
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.quality = Some(self.settings.quality.label().to_string());
    self.config.processing_mode = Some(self.settings.mode.label().to_string());
    self.config.max_results = Some(self.settings.max_results);
    self.config.max_size_mb = Some(self.settings.size_cap.mb());
    if self.persist_config {
      self.config.save();
    }
  }

  pub fn tool_available(&self) -> bool {
    matches!(self.tool_status, ToolStatus::Available(_))
  }

  pub fn is_busy(&self) -> bool {
    self.pending.is_some()
  }

  /// Modes offered right now: everything when yt-dlp works, embed only otherwise.
  pub fn available_modes(&self) -> Vec<ProcessingMode> {
    if self.tool_available() {
      ProcessingMode::ALL.to_vec()
    } else {
      vec![ProcessingMode::Embed]
    }
  }

  // --- Settings ---

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  pub fn next_quality(&mut self) {
    self.settings.quality = self.settings.quality.next();
    self.save_config();
  }

  pub fn next_mode(&mut self) {
    let modes = self.available_modes();
    let idx = modes.iter().position(|m| *m == self.settings.mode).map_or(0, |i| (i + 1) % modes.len());
    self.settings.mode = modes[idx];
    self.save_config();
  }

  pub fn next_max_results(&mut self) {
    let choices = &constants().max_results_choices;
    let idx = choices.iter().position(|n| *n == self.settings.max_results).map_or(0, |i| (i + 1) % choices.len());
    self.settings.max_results = choices[idx];
    self.save_config();
  }

  pub fn next_size_cap(&mut self) {
    self.settings.size_cap = self.settings.size_cap.next();
    self.save_config();
  }

  /// Replace the input with the next quick category / popular search.
  pub fn next_suggestion(&mut self) {
    let suggestions: Vec<&str> = constants().suggestions().collect();
    if suggestions.is_empty() {
      return;
    }
    let suggestion = suggestions[self.suggestion_idx % suggestions.len()];
    self.suggestion_idx = (self.suggestion_idx + 1) % suggestions.len();
    self.input = suggestion.to_string();
    self.cursor_position = self.input.chars().count();
    self.input_scroll = 0;
  }

  pub fn toggle_input_tab(&mut self) {
    self.input_tab = match self.input_tab {
      InputTab::Search => InputTab::Url,
      InputTab::Url => InputTab::Search,
    };
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
  }

  // --- Background tasks ---

  fn spawn_task<F>(&mut self, status: String, task: F)
  where
    F: Future<Output = TaskOutcome> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(task.await);
    });
    self.pending = Some(rx);
    self.status_message = Some(status);
  }

  /// Refuse new work while a request is running.
  fn refuse_if_busy(&mut self) -> bool {
    if self.is_busy() {
      self.set_info("Still working on the previous request.");
      return true;
    }
    false
  }

  /// The tool, if it may be invoked right now; sets a message otherwise.
  fn usable_tool(&mut self) -> Option<Tool> {
    match self.tool_status {
      ToolStatus::Available(_) => Some(self.tool.clone()),
      ToolStatus::Checking => {
        self.set_info("Still checking for yt-dlp…");
        None
      }
      ToolStatus::Missing => {
        self.set_error("yt-dlp not available.".to_string());
        None
      }
    }
  }

  /// Probe the tool once at startup.
  pub fn trigger_probe(&mut self) {
    let tool = self.tool.clone();
    self.tool_status = ToolStatus::Checking;
    self.spawn_task(format!("Checking for {}…", tool.display()), async move {
      let status = match tool.version().await {
        Ok(version) => ToolStatus::Available(version),
        Err(e) => {
          info!(err = %e, "probe: tool unavailable");
          ToolStatus::Missing
        }
      };
      TaskOutcome::Probe(status)
    });
  }

  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      self.set_error("Enter a search term.".to_string());
      return;
    }
    if self.refuse_if_busy() {
      return;
    }
    let tool = match self.tool_status {
      ToolStatus::Checking => {
        self.set_info("Still checking for yt-dlp…");
        return;
      }
      ToolStatus::Available(_) => Some(self.tool.clone()),
      ToolStatus::Missing => None,
    };
    info!(query = %query, offline = tool.is_none(), "search triggered");
    self.clear_error();
    self.info_message = None;

    let max_results = self.settings.max_results;
    self.spawn_task(format!("Searching '{}'…", query), async move {
      let result = youtube::search_videos(tool.as_ref(), &query, max_results).await;
      TaskOutcome::Search { query, result }
    });
  }

  /// Select the video named by the URL in the input box.
  pub fn load_url(&mut self) {
    match url::resolve(&self.input) {
      Some(id) => {
        info!(id = %id, "video loaded from URL");
        self.clear_error();
        self.session.select(VideoRecord::from_id(&id));
        self.mode = AppMode::Video;
        self.set_info("Video loaded from URL.");
      }
      None => self.set_error("Invalid YouTube URL.".to_string()),
    }
  }

  /// Select the highlighted search result.
  pub fn select_highlighted(&mut self) {
    let Some(idx) = self.list_state.selected() else { return };
    if self.session.select_result(idx) {
      self.clear_error();
      if let Some(video) = self.session.selected_video() {
        debug!(id = %video.id, "video selected");
      }
      self.mode = AppMode::Video;
    }
  }

  pub fn clear_results(&mut self) {
    self.session.clear_results();
    self.list_state.select(None);
    self.mode = AppMode::Input;
  }

  pub fn clear_selection(&mut self) {
    self.session.clear_selection();
    self.mode = if self.session.search_results().is_empty() { AppMode::Input } else { AppMode::Results };
  }

  fn selected_target(&self) -> Option<(String, String, u64)> {
    self.session.selected_video().map(|v| (v.id.clone(), v.url.clone(), self.session.generation()))
  }

  pub fn trigger_info(&mut self) {
    let Some((video_id, url, generation)) = self.selected_target() else { return };
    if self.refuse_if_busy() {
      return;
    }
    let Some(tool) = self.usable_tool() else { return };
    self.clear_error();
    self.spawn_task("Getting detailed video information…".to_string(), async move {
      let result = youtube::fetch_metadata(&tool, &url).await;
      TaskOutcome::Info { video_id, generation, result }
    });
  }

  /// Run the current processing mode on the selected video.
  pub fn trigger_process(&mut self) {
    let Some((video_id, url, generation)) = self.selected_target() else { return };
    let mode = self.settings.mode;

    if mode == ProcessingMode::Embed {
      self.session.set_embed_id(video_id.clone());
      self.set_info(format!("Embed ready: {} (o to open)", media::embed_url(&video_id)));
      return;
    }
    if self.refuse_if_busy() {
      return;
    }
    let Some(tool) = self.usable_tool() else { return };
    self.clear_error();

    match mode {
      ProcessingMode::Stream => {
        let tier = self.settings.quality.tier();
        self.spawn_task("Getting stream URL…".to_string(), async move {
          let result = youtube::resolve_stream(&tool, &url, tier).await;
          TaskOutcome::Stream { video_id, generation, result }
        });
      }
      ProcessingMode::Download => {
        let cap = self.settings.size_cap;
        self.spawn_task(format!("Downloading video (max {}MB)…", cap.mb()), async move {
          let result = youtube::download(&tool, &url, cap).await;
          TaskOutcome::Download { video_id, generation, result }
        });
      }
      ProcessingMode::AudioOnly => {
        let title = self.display_title();
        self.spawn_task("Getting audio stream…".to_string(), async move {
          let result = youtube::resolve_audio(&tool, &url).await;
          TaskOutcome::Audio { video_id, generation, title, result }
        });
      }
      ProcessingMode::Embed => {}
    }
  }

  /// Best known title for the selection: detailed info wins over the search row.
  pub fn display_title(&self) -> String {
    self
      .session
      .detailed_info()
      .map(|d| d.video.title.clone())
      .or_else(|| self.session.selected_video().map(|v| v.title.clone()))
      .unwrap_or_default()
  }

  pub async fn check_pending(&mut self) -> Result<()> {
    if let Some(mut rx) = self.pending.take() {
      match rx.try_recv() {
        Ok(outcome) => {
          self.status_message = None;
          self.apply_outcome(outcome).await;
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.pending = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Background task failed.".to_string());
        }
      }
    }
    Ok(())
  }

  /// Fold a finished task into the session.
  pub async fn apply_outcome(&mut self, outcome: TaskOutcome) {
    match outcome {
      TaskOutcome::Probe(status) => {
        info!(?status, "probe: finished");
        self.tool_status = status;
        if !self.tool_available() {
          if self.settings.mode.needs_tool() {
            self.settings.mode = ProcessingMode::Embed;
          }
          self.set_info("yt-dlp not found: limited search, embed only.");
        }
      }
      TaskOutcome::Search { query, result } => match result {
        Ok(SearchOutcome { videos, limited }) => {
          let count = videos.len();
          self.session.set_search_results(videos, limited);
          if count == 0 {
            self.list_state.select(None);
            self.set_error(format!("No videos found for '{}'. Try different keywords.", query));
          } else {
            self.list_state.select(Some(0));
            self.mode = AppMode::Results;
            if limited {
              self.set_info(format!("Found {} videos (limited search, install yt-dlp for full search).", count));
            } else {
              self.set_info(format!("Found {} videos.", count));
            }
          }
        }
        Err(e) => self.report_failure("Search failed", e),
      },
      TaskOutcome::Info { video_id, generation, result } => {
        if self.is_stale(&video_id, generation) {
          return;
        }
        match result {
          Ok(info) => {
            self.session.set_detailed_info(info);
            self.set_info("Detailed info retrieved.");
          }
          Err(e) => self.report_failure("Failed to get detailed info", e),
        }
      }
      TaskOutcome::Stream { video_id, generation, result } => {
        if self.is_stale(&video_id, generation) {
          return;
        }
        match result {
          Ok(stream_url) => {
            self.session.set_stream_url(stream_url);
            self.set_info("Stream URL obtained. p to play in mpv, o to open in browser.");
          }
          Err(e) => self.report_failure("Failed to get stream URL", e),
        }
      }
      TaskOutcome::Download { video_id, generation, result } => {
        if self.is_stale(&video_id, generation) {
          return;
        }
        match result {
          Ok(bytes) => {
            let mb = bytes.len() as f64 / 1024.0 / 1024.0;
            self.session.set_downloaded_bytes(bytes);
            self.set_info(format!("Video downloaded ({:.1} MB). w to save, o to open player.", mb));
          }
          Err(e) => self.report_failure("Download failed", e),
        }
      }
      TaskOutcome::Audio { video_id, generation, title, result } => {
        if self.is_stale(&video_id, generation) {
          return;
        }
        match result {
          Ok(stream_url) => {
            self.session.set_stream_url(stream_url.clone());
            let now_playing = NowPlaying { video_id, title, audio_only: true };
            if let Err(e) = self.player.play(&stream_url, now_playing).await {
              self.set_error(format!("Playback error: {:#}", e));
            }
          }
          Err(e) => self.report_failure("Failed to get audio stream", e),
        }
      }
    }
  }

  fn report_failure(&mut self, what: &str, e: ToolError) {
    warn!(kind = e.kind(), err = %e, "app: {}", what);
    if e.is_timeout() {
      self.set_error(format!("{}: {}. Try again, or lower the quality or size cap.", what, e));
    } else {
      self.set_error(format!("{}: {}", what, e));
    }
  }

  /// A result is stale once its video was deselected or selected again since the task started.
  fn is_stale(&self, video_id: &str, generation: u64) -> bool {
    let stale = generation != self.session.generation() || !self.session.is_selected(video_id);
    if stale {
      debug!(id = %video_id, generation, "app: discarding result for an earlier selection");
    }
    stale
  }

  // --- Media delivery ---

  /// Play the resolved stream URL in mpv.
  pub async fn play_stream(&mut self) {
    let Some(stream_url) = self.session.stream_url().map(str::to_string) else {
      self.set_info("Get a stream URL first.");
      return;
    };
    let Some(video) = self.session.selected_video() else { return };
    let now_playing = NowPlaying {
      video_id: video.id.clone(),
      title: self.display_title(),
      audio_only: self.settings.mode == ProcessingMode::AudioOnly,
    };
    if let Err(e) = self.player.play(&stream_url, now_playing).await {
      self.set_error(format!("Playback error: {:#}", e));
    }
  }

  /// Open the most specific output for the selection in the browser:
  /// embed player, downloaded-file page, stream URL, or the watch page.
  pub fn open_current(&mut self) {
    let Some(watch_url) = self.session.selected_video().map(|v| v.url.clone()) else { return };
    let target = if let Some(id) = self.session.embed_id() {
      Ok(media::embed_url(id))
    } else if self.session.downloaded_bytes().is_some() {
      self.player_page_target()
    } else if let Some(stream_url) = self.session.stream_url() {
      Ok(stream_url.to_string())
    } else {
      Ok(watch_url)
    };

    match target.and_then(|t| media::open_in_browser(&t)) {
      Ok(()) => self.set_info("Opened in browser."),
      Err(e) => self.set_error(format!("Failed to open browser: {:#}", e)),
    }
  }

  fn pages_dir(&mut self) -> Result<PathBuf> {
    if let Some(dir) = &self.page_dir {
      return Ok(dir.path().to_path_buf());
    }
    let dir = tempfile::Builder::new().prefix("ytsp-pages-").tempdir().context("Failed to create player page dir")?;
    let path = dir.path().to_path_buf();
    self.page_dir = Some(dir);
    Ok(path)
  }

  /// Player page for the downloaded video, written once per download.
  fn player_page_target(&mut self) -> Result<String> {
    if let Some(page) = self.session.player_page() {
      return Ok(page.path().to_string_lossy().into_owned());
    }
    let dir = self.pages_dir()?;
    let title = self.display_title();
    let (Some(video), Some(bytes)) = (self.session.selected_video(), self.session.downloaded_bytes()) else {
      anyhow::bail!("Download the video first.");
    };
    let page = media::write_player_page(&dir, &video.id, &title, bytes)?;
    let target = page.path().to_string_lossy().into_owned();
    self.session.set_player_page(page);
    Ok(target)
  }

  /// Write the downloaded bytes into the download directory.
  pub fn save_download(&mut self) {
    let Some(bytes) = self.session.downloaded_bytes() else {
      self.set_info("Download the video first.");
      return;
    };
    match media::save_download(&self.download_dir, &self.display_title(), bytes) {
      Ok(path) => self.set_info(format!("Saved to {}", path.display())),
      Err(e) => self.set_error(format!("{:#}", e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_app() -> App {
    App::for_tests()
  }

  fn available_app() -> App {
    let mut app = test_app();
    app.tool_status = ToolStatus::Available("2025.09.26".to_string());
    app
  }

  fn detailed(id: &str) -> DetailedVideoRecord {
    DetailedVideoRecord {
      video: VideoRecord::from_id(id).with_title("Detailed"),
      description: "d".to_string(),
      upload_date: "20240101".to_string(),
      formats_available: 2,
    }
  }

  // --- ProcessingMode / Settings ---

  #[test]
  fn processing_mode_from_config() {
    assert_eq!(ProcessingMode::from_config("Download"), ProcessingMode::Download);
    assert_eq!(ProcessingMode::from_config("audio"), ProcessingMode::AudioOnly);
    assert_eq!(ProcessingMode::from_config("EMBED"), ProcessingMode::Embed);
    assert_eq!(ProcessingMode::from_config("nonsense"), ProcessingMode::Stream);
  }

  #[test]
  fn settings_from_config_validates_ranges() {
    let config = Config {
      quality: Some("360p".to_string()),
      processing_mode: Some("download".to_string()),
      max_results: Some(999),
      max_size_mb: Some(7),
      ..Config::default()
    };
    let s = Settings::from_config(&config);
    assert_eq!(s.quality, Quality::P360);
    assert_eq!(s.mode, ProcessingMode::Download);
    assert_eq!(s.max_results, constants().max_results_default);
    assert_eq!(s.size_cap, SizeCap::default());
  }

  #[test]
  fn max_results_cycles_through_choices() {
    let mut app = test_app();
    let start = app.settings.max_results;
    for _ in 0..constants().max_results_choices.len() {
      app.next_max_results();
      assert!(constants().max_results_choices.contains(&app.settings.max_results));
    }
    assert_eq!(app.settings.max_results, start);
  }

  #[test]
  fn modes_without_tool_are_embed_only() {
    let mut app = test_app();
    app.tool_status = ToolStatus::Missing;
    assert_eq!(app.available_modes(), vec![ProcessingMode::Embed]);
    app.next_mode();
    assert_eq!(app.settings.mode, ProcessingMode::Embed);

    let mut app = available_app();
    app.next_mode();
    assert_eq!(app.settings.mode, ProcessingMode::Download);
  }

  #[test]
  fn suggestions_fill_input() {
    let mut app = test_app();
    app.next_suggestion();
    assert_eq!(app.input, constants().quick_categories[0]);
    assert_eq!(app.cursor_position, app.input.chars().count());
    app.next_suggestion();
    assert_eq!(app.input, constants().quick_categories[1]);
  }

  #[test]
  fn toggling_tab_clears_input() {
    let mut app = test_app();
    app.input = "cats".to_string();
    app.cursor_position = 4;
    app.toggle_input_tab();
    assert_eq!(app.input_tab, InputTab::Url);
    assert!(app.input.is_empty());
    assert_eq!(app.cursor_position, 0);
  }

  // --- Probe ---

  #[tokio::test]
  async fn missing_tool_forces_embed_mode() {
    let mut app = test_app();
    app.apply_outcome(TaskOutcome::Probe(ToolStatus::Missing)).await;
    assert_eq!(app.settings.mode, ProcessingMode::Embed);
    assert!(!app.tool_available());
  }

  #[tokio::test]
  async fn probe_of_missing_binary_reports_missing() {
    let mut app = test_app();
    app.trigger_probe();
    assert!(app.is_busy());
    let started = Instant::now();
    while app.is_busy() && started.elapsed() < Duration::from_secs(10) {
      app.check_pending().await.unwrap();
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.tool_status, ToolStatus::Missing);
  }

  // --- Search ---

  #[test]
  fn blank_search_is_rejected() {
    let mut app = available_app();
    app.input = "   ".to_string();
    app.trigger_search();
    assert_eq!(app.last_error.as_deref(), Some("Enter a search term."));
    assert!(!app.is_busy());
  }

  #[tokio::test]
  async fn offline_search_runs_against_catalog() {
    let mut app = test_app();
    app.tool_status = ToolStatus::Missing;
    app.input = "gangnam".to_string();
    app.trigger_search();
    let started = Instant::now();
    while app.is_busy() && started.elapsed() < Duration::from_secs(5) {
      app.check_pending().await.unwrap();
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.session.search_results().len(), 1);
    assert!(app.session.results_limited());
    assert_eq!(app.mode, AppMode::Results);
    assert!(app.info_message.as_deref().unwrap_or_default().contains("limited"));
  }

  #[tokio::test]
  async fn second_request_while_busy_is_refused() {
    let mut app = test_app();
    app.trigger_probe();
    app.tool_status = ToolStatus::Missing;
    app.input = "rick".to_string();
    app.trigger_search();
    assert_eq!(app.info_message.as_deref(), Some("Still working on the previous request."));
  }

  #[tokio::test]
  async fn empty_search_result_is_an_error_message() {
    let mut app = available_app();
    let outcome = SearchOutcome { videos: Vec::new(), limited: false };
    app.apply_outcome(TaskOutcome::Search { query: "zzz".to_string(), result: Ok(outcome) }).await;
    assert!(app.last_error.as_deref().unwrap().contains("No videos found"));
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn failed_search_surfaces_error() {
    let mut app = available_app();
    let result = Err(ToolError::Timeout(Duration::from_secs(30)));
    app.apply_outcome(TaskOutcome::Search { query: "cats".to_string(), result }).await;
    assert_eq!(
      app.last_error.as_deref(),
      Some("Search failed: yt-dlp timed out after 30s. Try again, or lower the quality or size cap.")
    );
  }

  // --- Selection ---

  #[test]
  fn load_url_selects_video() {
    let mut app = test_app();
    app.input = "https://youtu.be/dQw4w9WgXcQ".to_string();
    app.load_url();
    assert!(app.session.is_selected("dQw4w9WgXcQ"));
    assert_eq!(app.mode, AppMode::Video);

    app.input = "not a url".to_string();
    app.load_url();
    assert_eq!(app.last_error.as_deref(), Some("Invalid YouTube URL."));
    assert!(app.session.is_selected("dQw4w9WgXcQ"));
  }

  #[test]
  fn select_highlighted_result() {
    let mut app = test_app();
    app.session.set_search_results(vec![VideoRecord::from_id("aaaaaaaaaaa"), VideoRecord::from_id("bbbbbbbbbbb")], false);
    app.list_state.select(Some(1));
    app.select_highlighted();
    assert!(app.session.is_selected("bbbbbbbbbbb"));
    assert_eq!(app.mode, AppMode::Video);
  }

  #[test]
  fn embed_needs_no_tool() {
    let mut app = test_app();
    app.tool_status = ToolStatus::Missing;
    app.settings.mode = ProcessingMode::Embed;
    app.session.select(VideoRecord::from_id("dQw4w9WgXcQ"));
    app.trigger_process();
    assert_eq!(app.session.embed_id(), Some("dQw4w9WgXcQ"));
    assert!(!app.is_busy());
  }

  #[test]
  fn info_without_tool_is_refused() {
    let mut app = test_app();
    app.tool_status = ToolStatus::Missing;
    app.session.select(VideoRecord::from_id("dQw4w9WgXcQ"));
    app.trigger_info();
    assert_eq!(app.last_error.as_deref(), Some("yt-dlp not available."));
    assert!(!app.is_busy());
  }

  fn info_outcome(app: &App, id: &str) -> TaskOutcome {
    TaskOutcome::Info { video_id: id.to_string(), generation: app.session.generation(), result: Ok(detailed(id)) }
  }

  fn stream_outcome(app: &App, id: &str, url: &str) -> TaskOutcome {
    TaskOutcome::Stream { video_id: id.to_string(), generation: app.session.generation(), result: Ok(url.to_string()) }
  }

  #[tokio::test]
  async fn results_for_deselected_video_are_dropped() {
    let mut app = available_app();
    app.session.select(VideoRecord::from_id("bbbbbbbbbbb"));
    app.apply_outcome(info_outcome(&app, "aaaaaaaaaaa")).await;
    assert!(app.session.detailed_info().is_none());
    app.apply_outcome(stream_outcome(&app, "aaaaaaaaaaa", "https://x")).await;
    assert!(app.session.stream_url().is_none());
  }

  #[tokio::test]
  async fn results_for_earlier_selection_of_same_video_are_dropped() {
    let mut app = available_app();
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa"));
    let old = stream_outcome(&app, "aaaaaaaaaaa", "https://old");
    app.session.clear_selection();
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa"));
    app.apply_outcome(old).await;
    assert!(app.session.stream_url().is_none());

    app.apply_outcome(stream_outcome(&app, "aaaaaaaaaaa", "https://new")).await;
    assert_eq!(app.session.stream_url(), Some("https://new"));
  }

  #[tokio::test]
  async fn outcomes_for_selected_video_are_stored() {
    let mut app = available_app();
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa"));
    app.apply_outcome(info_outcome(&app, "aaaaaaaaaaa")).await;
    let generation = app.session.generation();
    app
      .apply_outcome(TaskOutcome::Download { video_id: "aaaaaaaaaaa".to_string(), generation, result: Ok(vec![0; 2048]) })
      .await;
    assert_eq!(app.display_title(), "Detailed");
    assert_eq!(app.session.downloaded_bytes().map(<[u8]>::len), Some(2048));
    assert!(app.info_message.as_deref().unwrap().starts_with("Video downloaded (0.0 MB)"));
  }

  #[tokio::test]
  async fn clear_selection_drops_all_outputs() {
    let mut app = available_app();
    app.session.set_search_results(vec![VideoRecord::from_id("aaaaaaaaaaa")], false);
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa"));
    app.apply_outcome(info_outcome(&app, "aaaaaaaaaaa")).await;
    app.apply_outcome(stream_outcome(&app, "aaaaaaaaaaa", "https://s")).await;
    app.clear_selection();
    assert!(app.session.selected_video().is_none());
    assert!(app.session.detailed_info().is_none());
    assert!(app.session.stream_url().is_none());
    assert_eq!(app.mode, AppMode::Results);
  }

  #[test]
  fn save_download_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app();
    app.download_dir = dir.path().to_path_buf();
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa").with_title("Clip"));
    app.save_download();
    assert_eq!(app.info_message.as_deref(), Some("Download the video first."));
    app.session.set_downloaded_bytes(b"mp4".to_vec());
    app.save_download();
    assert_eq!(std::fs::read(dir.path().join("Clip.mp4")).unwrap(), b"mp4");
  }

  #[test]
  fn player_page_is_reused_and_removed_with_selection_and_app() {
    let mut app = test_app();
    app.session.select(VideoRecord::from_id("aaaaaaaaaaa").with_title("Clip"));
    app.session.set_downloaded_bytes(b"mp4".to_vec());
    let page = PathBuf::from(app.player_page_target().unwrap());
    assert!(page.exists());
    assert_eq!(app.player_page_target().unwrap(), page.to_string_lossy());

    app.clear_selection();
    assert!(!page.exists());

    app.session.select(VideoRecord::from_id("bbbbbbbbbbb"));
    app.session.set_downloaded_bytes(b"mp4".to_vec());
    let page = PathBuf::from(app.player_page_target().unwrap());
    let dir = page.parent().unwrap().to_path_buf();
    assert!(page.exists());
    drop(app);
    assert!(!page.exists());
    assert!(!dir.exists());
  }
}
