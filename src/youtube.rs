use tracing::{debug, info, warn};

use crate::catalog;
use crate::constants::constants;
use crate::error::ToolError;
use crate::format::{Container, QualityTier, SizeCap, audio_selector};
use crate::tool::Tool;
use crate::url;
use crate::video::{DetailedVideoRecord, RawInfo, VideoRecord, truncate_description};

/// Result of a search. `limited` marks offline catalog results, which are
/// not a real search and must be labelled as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
  pub videos: Vec<VideoRecord>,
  pub limited: bool,
}

/// Parse `--dump-json` search output: one JSON object per line.
/// Malformed lines and entries without an id are skipped; order is preserved.
fn parse_search_output(stdout: &str) -> Vec<VideoRecord> {
  stdout
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .filter_map(|line| match serde_json::from_str::<RawInfo>(line) {
      Ok(raw) => raw.into_record(None),
      Err(e) => {
        debug!(err = %e, "search: skipping malformed line");
        None
      }
    })
    .collect()
}

/// Search YouTube through the tool, or the offline catalog when `tool` is `None`.
pub async fn search_videos(tool: Option<&Tool>, query: &str, max_results: usize) -> Result<SearchOutcome, ToolError> {
  let query = query.trim();
  let Some(tool) = tool else {
    let videos = catalog::search(query, max_results);
    info!(query = %query, results = videos.len(), "search: offline catalog");
    return Ok(SearchOutcome { videos, limited: true });
  };
  if query.is_empty() {
    return Ok(SearchOutcome { videos: Vec::new(), limited: false });
  }

  let count = max_results.to_string();
  let term = format!("{}{}:{}", constants().search_provider, max_results, query);
  let output = tool
    .run(
      &["--dump-json", "--no-download", "--flat-playlist", "--playlist-end", &count, "--no-warnings", "--", &term],
      constants().query_timeout(),
    )
    .await?;

  let videos = parse_search_output(&String::from_utf8_lossy(&output.stdout));
  info!(query = %query, results = videos.len(), "search: done");
  Ok(SearchOutcome { videos, limited: false })
}

/// Map a single `--dump-json` document. `url` supplies the id when the
/// document lacks one.
fn parse_metadata(stdout: &[u8], url: &str) -> Result<DetailedVideoRecord, ToolError> {
  let mut raw: RawInfo = serde_json::from_slice(stdout)?;
  let description = raw.description.take().unwrap_or_default();
  let upload_date = raw.upload_date.take().unwrap_or_default();
  let formats_available = raw.formats.take().map_or(0, |f| f.len());

  let fallback_id = url::resolve(url);
  let video = raw.into_record(fallback_id.as_deref()).ok_or_else(|| ToolError::Parse("metadata has no video id".to_string()))?;

  Ok(DetailedVideoRecord {
    video,
    description: truncate_description(description.trim(), constants().description_max_chars),
    upload_date,
    formats_available,
  })
}

/// Full metadata for a single video.
pub async fn fetch_metadata(tool: &Tool, url: &str) -> Result<DetailedVideoRecord, ToolError> {
  let output = tool
    .run(&["--dump-json", "--no-download", "--no-playlist", "--no-warnings", "--", url], constants().query_timeout())
    .await?;
  let detailed = parse_metadata(&output.stdout, url)?;
  info!(id = %detailed.video.id, formats = detailed.formats_available, "metadata: done");
  Ok(detailed)
}

/// Ask the tool for the direct media URL matching `selector`.
async fn resolve_direct_url(tool: &Tool, url: &str, selector: &str) -> Result<String, ToolError> {
  let output =
    tool.run(&["-f", selector, "--get-url", "--no-playlist", "--no-warnings", "--", url], constants().query_timeout()).await?;
  // Split video+audio formats print two URLs; the first is the video.
  let stdout = String::from_utf8_lossy(&output.stdout);
  stdout.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string).ok_or(ToolError::MissingOutput("stream URL"))
}

/// Direct, time-limited stream URL no taller than the tier's ceiling.
/// Never cache the result beyond the current session.
pub async fn resolve_stream(tool: &Tool, url: &str, tier: QualityTier) -> Result<String, ToolError> {
  let stream = resolve_direct_url(tool, url, &tier.stream_selector()).await?;
  info!(max_height = tier.max_height, "stream: resolved");
  Ok(stream)
}

/// Direct URL of the best audio-only encoding.
pub async fn resolve_audio(tool: &Tool, url: &str) -> Result<String, ToolError> {
  let stream = resolve_direct_url(tool, url, &audio_selector()).await?;
  info!("audio: resolved");
  Ok(stream)
}

/// Download a size-capped video and return its bytes.
///
/// The file lives in a uniquely named temporary directory that is removed on
/// every return path, including tool failure and timeout.
pub async fn download(tool: &Tool, url: &str, cap: SizeCap) -> Result<Vec<u8>, ToolError> {
  std::fs::create_dir_all(tool.scratch_dir())?;
  let scratch = tempfile::Builder::new().prefix("ytsp-dl-").tempdir_in(tool.scratch_dir())?;
  let target = scratch.path().join("video.mp4");
  // yt-dlp treats -o as a template; a literal % must be doubled.
  let template = target.to_string_lossy().replace('%', "%%");
  let selector = cap.download_selector(Container::Mp4);

  info!(max_mb = cap.mb(), dir = %scratch.path().display(), "download: starting");
  tool
    .run(
      &["-f", &selector, "-o", &template, "--no-playlist", "--no-warnings", "--", url],
      constants().download_timeout(),
    )
    .await?;

  let bytes = match tokio::fs::read(&target).await {
    Ok(bytes) if !bytes.is_empty() => bytes,
    Ok(_) => return Err(ToolError::MissingOutput("video file")),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      warn!(path = %target.display(), "download: tool succeeded but file is missing");
      return Err(ToolError::MissingOutput("video file"));
    }
    Err(e) => return Err(e.into()),
  };
  info!(bytes = bytes.len(), "download: done");
  Ok(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const VALID_A: &str = r#"{"id":"aaaaaaaaaaa","title":"First","uploader":"Up A","duration":90,"view_count":1000}"#;
  const VALID_B: &str = r#"{"id":"bbbbbbbbbbb","title":"Second","channel":"Chan B","duration":12.7}"#;

  #[test]
  fn parse_search_skips_malformed_line_and_keeps_order() {
    let stdout = format!("{VALID_A}\n{{\"id\": broken\n{VALID_B}\n");
    let videos = parse_search_output(&stdout);
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "aaaaaaaaaaa");
    assert_eq!(videos[0].view_count, Some(1000));
    assert_eq!(videos[1].id, "bbbbbbbbbbb");
    assert_eq!(videos[1].uploader, "Chan B");
    assert_eq!(videos[1].duration, Some(12));
  }

  #[test]
  fn parse_search_skips_blank_lines_and_idless_entries() {
    let stdout = format!("\n\n{VALID_A}\n   \n{{\"title\":\"no id\"}}\n[1,2]\n");
    let videos = parse_search_output(&stdout);
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "First");
  }

  #[test]
  fn parse_metadata_maps_detail_fields() {
    let doc = json!({
      "id": "dQw4w9WgXcQ",
      "title": "Never Gonna Give You Up",
      "uploader": "Rick Astley",
      "duration": 213,
      "view_count": 1_500_000_000u64,
      "description": "short",
      "upload_date": "20091025",
      "formats": [{}, {}, {}],
    });
    let d = parse_metadata(doc.to_string().as_bytes(), "https://youtu.be/dQw4w9WgXcQ").unwrap();
    assert_eq!(d.video.title, "Never Gonna Give You Up");
    assert_eq!(d.video.view_count, Some(1_500_000_000));
    assert_eq!(d.description, "short");
    assert_eq!(d.upload_date, "20091025");
    assert_eq!(d.formats_available, 3);
  }

  #[test]
  fn parse_metadata_truncates_long_description() {
    let doc = json!({"id": "x1234567890", "description": "d".repeat(400)});
    let d = parse_metadata(doc.to_string().as_bytes(), "").unwrap();
    assert_eq!(d.description.len(), 303);
    assert_eq!(&d.description[300..], "...");
    assert!(d.description[..300].chars().all(|c| c == 'd'));
  }

  #[test]
  fn parse_metadata_keeps_fifty_char_description() {
    let text = "x".repeat(50);
    let doc = json!({"id": "x1234567890", "description": text.clone()});
    let d = parse_metadata(doc.to_string().as_bytes(), "").unwrap();
    assert_eq!(d.description, text);
  }

  #[test]
  fn parse_metadata_empty_description_stays_empty() {
    let doc = json!({"id": "x1234567890", "description": null});
    assert_eq!(parse_metadata(doc.to_string().as_bytes(), "").unwrap().description, "");
  }

  #[test]
  fn parse_metadata_takes_id_from_url_when_missing() {
    let doc = json!({"title": "No id here"});
    let d = parse_metadata(doc.to_string().as_bytes(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
    assert_eq!(d.video.id, "dQw4w9WgXcQ");
    assert!(matches!(parse_metadata(doc.to_string().as_bytes(), "nothing"), Err(ToolError::Parse(_))));
  }

  #[test]
  fn parse_metadata_rejects_garbage() {
    assert!(matches!(parse_metadata(b"ERROR not json", ""), Err(ToolError::Parse(_))));
    assert!(matches!(parse_metadata(b"", ""), Err(ToolError::Parse(_))));
  }

  #[tokio::test]
  async fn offline_search_is_limited_catalog() {
    let outcome = search_videos(None, "gangnam", 10).await.unwrap();
    assert!(outcome.limited);
    assert_eq!(outcome.videos.len(), 1);
    assert!(outcome.videos[0].title.to_lowercase().contains("gangnam"));
  }

  #[cfg(unix)]
  mod unix {
    use super::*;
    use crate::format::Quality;
    use crate::tool::test_support::fake_tool;
    use std::time::Duration;

    fn heredoc(body: &str) -> String {
      format!("cat <<'JSON'\n{body}\nJSON\n")
    }

    fn scratch_is_empty(tool: &Tool) -> bool {
      std::fs::read_dir(tool.scratch_dir()).expect("scratch dir exists").next().is_none()
    }

    const DOWNLOAD_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then printf 'fake-mp4-bytes' > "$2"; fi
  shift
done
"#;

    #[tokio::test]
    async fn search_returns_valid_records_around_malformed_line() {
      let (_dir, tool) = fake_tool(&heredoc(&format!("{VALID_A}\nnot json at all\n{VALID_B}")));
      let outcome = search_videos(Some(&tool), "anything", 5).await.unwrap();
      assert!(!outcome.limited);
      let ids: Vec<&str> = outcome.videos.iter().map(|v| v.id.as_str()).collect();
      assert_eq!(ids, ["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[tokio::test]
    async fn search_passes_provider_query_and_cap() {
      let script = r#"
for last; do :; done
[ "$last" = "ytsearch7:lofi beats" ] || exit 9
echo '{"id":"ccccccccccc","title":"ok"}'
"#;
      let (_dir, tool) = fake_tool(script);
      let outcome = search_videos(Some(&tool), "  lofi beats ", 7).await.unwrap();
      assert_eq!(outcome.videos.len(), 1);
    }

    #[tokio::test]
    async fn search_failure_is_an_error_not_an_empty_success() {
      let (_dir, tool) = fake_tool("echo 'ERROR: network down' >&2\nexit 1\n");
      let err = search_videos(Some(&tool), "cats", 5).await.unwrap_err();
      assert!(matches!(err, ToolError::Failed { .. }));
    }

    #[tokio::test]
    async fn metadata_roundtrip_through_tool() {
      let doc = json!({"id": "dQw4w9WgXcQ", "title": "T", "description": "y".repeat(301), "formats": [{}]});
      let (_dir, tool) = fake_tool(&heredoc(&doc.to_string()));
      let d = fetch_metadata(&tool, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
      assert_eq!(d.description.chars().count(), 303);
      assert_eq!(d.formats_available, 1);
    }

    #[tokio::test]
    async fn metadata_failure_is_reported() {
      let (_dir, tool) = fake_tool("exit 2\n");
      assert!(matches!(fetch_metadata(&tool, "u").await, Err(ToolError::Failed { .. })));
    }

    #[tokio::test]
    async fn stream_uses_tier_selector_and_first_line() {
      let script = r#"
[ "$1" = "-f" ] || exit 9
[ "$2" = "best[height<=480][ext=mp4]/best[ext=mp4]/best" ] || exit 9
echo 'https://cdn.example/video.mp4?expire=1'
echo 'https://cdn.example/audio.m4a'
"#;
      let (_dir, tool) = fake_tool(script);
      let url = resolve_stream(&tool, "https://youtu.be/dQw4w9WgXcQ", Quality::P480.tier()).await.unwrap();
      assert_eq!(url, "https://cdn.example/video.mp4?expire=1");
    }

    #[tokio::test]
    async fn empty_stream_output_is_missing() {
      let (_dir, tool) = fake_tool("echo ''\n");
      let err = resolve_stream(&tool, "u", Quality::P720.tier()).await.unwrap_err();
      assert!(matches!(err, ToolError::MissingOutput(_)));
    }

    #[tokio::test]
    async fn audio_uses_audio_selector() {
      let (_dir, tool) = fake_tool("[ \"$2\" = 'bestaudio[ext=m4a]/bestaudio/best' ] || exit 9\necho https://cdn.example/a.m4a\n");
      assert_eq!(resolve_audio(&tool, "u").await.unwrap(), "https://cdn.example/a.m4a");
    }

    #[tokio::test]
    async fn download_reads_file_and_removes_it() {
      let (_dir, tool) = fake_tool(DOWNLOAD_SCRIPT);
      let bytes = download(&tool, "https://youtu.be/dQw4w9WgXcQ", SizeCap::default()).await.unwrap();
      assert_eq!(bytes, b"fake-mp4-bytes");
      assert!(scratch_is_empty(&tool));
    }

    #[tokio::test]
    async fn failed_download_still_removes_file() {
      let (_dir, tool) = fake_tool(&format!("{DOWNLOAD_SCRIPT}\nexit 1\n"));
      let err = download(&tool, "u", SizeCap::default()).await.unwrap_err();
      assert!(matches!(err, ToolError::Failed { .. }));
      assert!(scratch_is_empty(&tool));
    }

    #[tokio::test]
    async fn download_without_file_is_missing_output() {
      let (_dir, tool) = fake_tool("exit 0\n");
      let err = download(&tool, "u", SizeCap::default()).await.unwrap_err();
      assert!(matches!(err, ToolError::MissingOutput(_)));
      assert!(scratch_is_empty(&tool));
    }

    #[tokio::test]
    async fn download_passes_size_selector() {
      let script = format!("[ \"$2\" = 'best[filesize<25M][ext=mp4]/worst[ext=mp4]' ] || exit 9\n{DOWNLOAD_SCRIPT}");
      let (_dir, tool) = fake_tool(&script);
      let cap = SizeCap::new(25).unwrap();
      assert!(download(&tool, "u", cap).await.is_ok());
    }

    #[tokio::test]
    async fn download_creates_missing_scratch_dir() {
      let (dir, tool) = fake_tool(DOWNLOAD_SCRIPT);
      let tool = tool.with_scratch_dir(dir.path().join("not").join("yet"));
      assert_eq!(download(&tool, "u", SizeCap::default()).await.unwrap(), b"fake-mp4-bytes");
      assert!(scratch_is_empty(&tool));
    }

    #[tokio::test]
    async fn abandoned_download_removes_file() {
      let (_dir, tool) = fake_tool(&format!("{DOWNLOAD_SCRIPT}
exec sleep 5
"));
      let abandoned = tokio::time::timeout(Duration::from_millis(500), download(&tool, "u", SizeCap::default())).await;
      assert!(abandoned.is_err());
      assert!(scratch_is_empty(&tool));
    }
  }
}
