use crate::media::PlayerPage;
use crate::video::{DetailedVideoRecord, VideoRecord};

/// Per-session state: what the user searched for, which video is selected,
/// and the outputs produced for that selection.
///
/// All per-selection outputs are reset together whenever the selection
/// changes or is cleared, so nothing stale from a previous video survives.
#[derive(Debug, Default)]
pub struct SessionState {
  search_results: Vec<VideoRecord>,
  /// Whether `search_results` came from the offline catalog.
  results_limited: bool,
  selected_video: Option<VideoRecord>,
  last_detailed_info: Option<DetailedVideoRecord>,
  last_stream_url: Option<String>,
  last_downloaded_bytes: Option<Vec<u8>>,
  embed_id: Option<String>,
  /// Player page generated from `last_downloaded_bytes`; its file goes away with it.
  player_page: Option<PlayerPage>,
  /// Bumped on every select and clear.
  generation: u64,
}

impl SessionState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn search_results(&self) -> &[VideoRecord] {
    &self.search_results
  }

  pub fn results_limited(&self) -> bool {
    self.results_limited
  }

  pub fn set_search_results(&mut self, results: Vec<VideoRecord>, limited: bool) {
    self.search_results = results;
    self.results_limited = limited;
  }

  /// Drop the results and the selection built on them.
  pub fn clear_results(&mut self) {
    self.search_results.clear();
    self.results_limited = false;
    self.clear_selection();
  }

  pub fn selected_video(&self) -> Option<&VideoRecord> {
    self.selected_video.as_ref()
  }

  pub fn is_selected(&self, id: &str) -> bool {
    self.selected_video.as_ref().is_some_and(|v| v.id == id)
  }

  /// Select `video`. Outputs from any previous selection are dropped, even
  /// when the same video is selected again.
  pub fn select(&mut self, video: VideoRecord) {
    self.clear_outputs();
    self.selected_video = Some(video);
    self.generation = self.generation.wrapping_add(1);
  }

  /// Identifies the current selection. Re-selecting the same video yields a new value.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Select the search result at `index`. Returns `false` if out of range.
  pub fn select_result(&mut self, index: usize) -> bool {
    match self.search_results.get(index).cloned() {
      Some(video) => {
        self.select(video);
        true
      }
      None => false,
    }
  }

  pub fn clear_selection(&mut self) {
    self.selected_video = None;
    self.clear_outputs();
    self.generation = self.generation.wrapping_add(1);
  }

  fn clear_outputs(&mut self) {
    self.last_detailed_info = None;
    self.last_stream_url = None;
    self.last_downloaded_bytes = None;
    self.embed_id = None;
    self.player_page = None;
  }

  pub fn detailed_info(&self) -> Option<&DetailedVideoRecord> {
    self.last_detailed_info.as_ref()
  }

  pub fn set_detailed_info(&mut self, info: DetailedVideoRecord) {
    self.last_detailed_info = Some(info);
  }

  pub fn stream_url(&self) -> Option<&str> {
    self.last_stream_url.as_deref()
  }

  pub fn set_stream_url(&mut self, url: String) {
    self.last_stream_url = Some(url);
  }

  pub fn downloaded_bytes(&self) -> Option<&[u8]> {
    self.last_downloaded_bytes.as_deref()
  }

  pub fn set_downloaded_bytes(&mut self, bytes: Vec<u8>) {
    self.player_page = None;
    self.last_downloaded_bytes = Some(bytes);
  }

  pub fn embed_id(&self) -> Option<&str> {
    self.embed_id.as_deref()
  }

  pub fn set_embed_id(&mut self, id: String) {
    self.embed_id = Some(id);
  }

  pub fn player_page(&self) -> Option<&PlayerPage> {
    self.player_page.as_ref()
  }

  pub fn set_player_page(&mut self, page: PlayerPage) {
    self.player_page = Some(page);
  }
}
