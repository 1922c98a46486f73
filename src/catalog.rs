//! Offline demo catalog, used in place of search when yt-dlp is missing.
//!
//! This is a fixed placeholder list so the UI stays usable without the tool. Results
//! from here are always flagged as limited.

use crate::constants::{DemoVideo, constants};
use crate::video::VideoRecord;

fn to_record(demo: &DemoVideo) -> VideoRecord {
  VideoRecord::from_id(&demo.id)
    .with_title(demo.title.clone())
    .with_uploader(demo.uploader.clone())
    .with_duration(Some(demo.duration))
}

/// Case-insensitive substring match on title or uploader, in catalog order.
pub fn search(query: &str, max_results: usize) -> Vec<VideoRecord> {
  let needle = query.trim().to_lowercase();
  constants()
    .demo_catalog
    .iter()
    .filter(|v| v.title.to_lowercase().contains(&needle) || v.uploader.to_lowercase().contains(&needle))
    .take(max_results)
    .map(to_record)
    .collect()
}
