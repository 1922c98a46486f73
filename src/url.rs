use regex::Regex;
use std::sync::LazyLock;

/// URL shapes that carry a video id, tried in order. First match wins.
static ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
  [
    // watch?v=ID, youtu.be/ID, /embed/ID
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#/]+)").expect("valid id regex"),
    // watch?...&v=ID
    Regex::new(r"youtube\.com/watch\?(?:[^#\n]*&)?v=([^&\n?#]+)").expect("valid id regex"),
  ]
});

const BARE_ID_LEN: usize = 11;

/// Extract a video id from a YouTube URL or a bare 11-character id.
pub fn resolve(input: &str) -> Option<String> {
  let input = input.trim();
  if input.is_empty() {
    return None;
  }

  for pattern in ID_PATTERNS.iter() {
    if let Some(id) = pattern.captures(input).and_then(|c| c.get(1)) {
      return Some(id.as_str().to_string());
    }
  }

  is_bare_id(input).then(|| input.to_string())
}

fn is_bare_id(s: &str) -> bool {
  s.len() == BARE_ID_LEN && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
