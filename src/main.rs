mod app;
mod catalog;
mod config;
mod constants;
mod error;
mod format;
mod input;
mod logging;
mod media;
mod player;
mod session;
mod theme;
mod tool;
mod ui;
mod url;
mod video;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use app::{App, ProcessingMode, Settings};
use config::Config;
use constants::constants;
use format::{Quality, SizeCap};
use tool::Tool;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Command that runs yt-dlp, e.g. "python3 -m yt_dlp" (default: yt-dlp)
  #[arg(long, value_name = "CMD")]
  tool: Option<String>,

  /// Highest stream resolution
  #[arg(short, long)]
  quality: Option<Quality>,

  /// What to do with a selected video
  #[arg(short, long)]
  mode: Option<ProcessingMode>,

  /// Results per search: 5, 10, 15 or 20
  #[arg(long, value_parser = parse_max_results)]
  max_results: Option<usize>,

  /// Download size cap in MB: 10, 25, 50, 75 or 100
  #[arg(long, value_name = "MB", value_parser = parse_size_cap)]
  max_size: Option<SizeCap>,

  /// Directory for ytsp.log (default: the platform data dir)
  #[arg(long, value_name = "DIR")]
  log_dir: Option<PathBuf>,

  /// Check whether yt-dlp can be run, then exit
  #[arg(long)]
  check: bool,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

fn parse_max_results(s: &str) -> Result<usize, String> {
  let n: usize = s.parse().map_err(|e| format!("{e}"))?;
  let choices = &constants().max_results_choices;
  if choices.contains(&n) { Ok(n) } else { Err(format!("must be one of {:?}", choices)) }
}

fn parse_size_cap(s: &str) -> Result<SizeCap, String> {
  let mb: u32 = s.parse().map_err(|e| format!("{e}"))?;
  SizeCap::new(mb).ok_or_else(|| format!("must be one of {:?}", constants().max_size_choices_mb))
}

/// Persisted preferences with this run's flags on top.
fn resolve_settings(args: &Args, config: &Config) -> Settings {
  let mut settings = Settings::from_config(config);
  if let Some(quality) = args.quality {
    settings.quality = quality;
  }
  if let Some(mode) = args.mode {
    settings.mode = mode;
  }
  if let Some(n) = args.max_results {
    settings.max_results = n;
  }
  if let Some(cap) = args.max_size {
    settings.size_cap = cap;
  }
  settings
}

fn resolve_tool(args: &Args, config: &Config) -> Result<Tool> {
  let tool = match args.tool.as_deref().or(config.tool.as_deref()) {
    Some(cmd) => Tool::from_command_line(cmd).with_context(|| format!("Invalid tool command: {:?}", cmd))?,
    None => Tool::default(),
  };
  Ok(match &config.scratch_dir {
    Some(dir) => tool.with_scratch_dir(dir),
    None => tool,
  })
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let (_log_guard, log_path) = logging::init_tracing(args.log_dir.clone())?;
  info!(version = env!("CARGO_PKG_VERSION"), log = %log_path.display(), "ytsp starting");

  let config = Config::load();
  let settings = resolve_settings(&args, &config);
  let tool = resolve_tool(&args, &config)?;

  if args.check {
    if tool.is_available().await {
      println!("{} is available", tool.display());
      return Ok(());
    }
    anyhow::bail!("{} is not available; search falls back to the demo catalog", tool.display());
  }
  info!(tool = %tool.display(), ?settings, "configuration resolved");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, App::new(config, settings, tool)).await;
  ratatui::restore();
  if let Err(ref e) = result {
    let msg = format!("{:#}", e);
    tracing::error!(err = %msg, "ytsp exited with error");
  }
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  app.trigger_probe();

  loop {
    app.check_pending().await?;
    app.player.check_mpv_status();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  info!("ytsp exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_definition_is_valid() {
    Args::command().debug_assert();
  }

  #[test]
  fn flags_override_persisted_settings() {
    let args = Args::parse_from(["ytsp", "--quality", "480p", "--mode", "audio", "--max-size", "25"]);
    let config = Config { quality: Some("1080p".to_string()), max_results: Some(15), ..Config::default() };
    let settings = resolve_settings(&args, &config);
    assert_eq!(settings.quality, Quality::P480);
    assert_eq!(settings.mode, ProcessingMode::AudioOnly);
    assert_eq!(settings.max_results, 15);
    assert_eq!(settings.size_cap.mb(), 25);
  }

  #[test]
  fn out_of_range_flags_are_rejected() {
    assert!(Args::try_parse_from(["ytsp", "--max-results", "7"]).is_err());
    assert!(Args::try_parse_from(["ytsp", "--max-size", "60"]).is_err());
  }

  #[test]
  fn tool_flag_beats_config() {
    let args = Args::parse_from(["ytsp", "--tool", "python3 -m yt_dlp"]);
    let config = Config { tool: Some("yt-dlp-nightly".to_string()), ..Config::default() };
    assert_eq!(resolve_tool(&args, &config).unwrap().display(), "python3 -m yt_dlp");
    assert!(resolve_tool(&Args::parse_from(["ytsp", "--tool", "  "]), &Config::default()).is_err());
  }

  #[test]
  fn scratch_dir_comes_from_config() {
    let config = Config { scratch_dir: Some(PathBuf::from("/var/tmp/ytsp")), ..Config::default() };
    let tool = resolve_tool(&Args::parse_from(["ytsp"]), &config).unwrap();
    assert_eq!(tool.scratch_dir(), std::path::Path::new("/var/tmp/ytsp"));
  }
}
