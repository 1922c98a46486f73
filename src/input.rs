use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode, InputTab};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return Ok(());
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return Ok(());
      }
      KeyCode::Char('u') => {
        app.toggle_input_tab();
        app.mode = AppMode::Input;
        return Ok(());
      }
      KeyCode::Char('s') => {
        if app.player.is_playing() {
          app.player.stop().await.context("Failed to stop playback")?;
        }
        return Ok(());
      }
      _ => {}
    }
  }

  let setting_changed = match key.code {
    KeyCode::F(2) => {
      app.next_quality();
      true
    }
    KeyCode::F(3) => {
      app.next_mode();
      true
    }
    KeyCode::F(4) => {
      app.next_max_results();
      true
    }
    KeyCode::F(5) => {
      app.next_size_cap();
      true
    }
    _ => false,
  };
  if setting_changed {
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
    AppMode::Video => handle_video_key(app, key).await.context("Failed to handle video key event")?,
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => match app.input_tab {
      InputTab::Search => app.trigger_search(),
      InputTab::Url => app.load_url(),
    },
    KeyCode::Tab => {
      if app.input_tab == InputTab::Search {
        app.next_suggestion();
      }
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if app.session.selected_video().is_some() {
        app.mode = AppMode::Video;
      } else if !app.session.search_results().is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.session.search_results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  let count = app.session.search_results().len();
  match key.code {
    KeyCode::Enter => {
      app.select_highlighted();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| (i + 1) % count);
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      if count > 0 {
        let i =
          app.list_state.selected().map_or(0, |i| if i == 0 { count.saturating_sub(1) } else { i.saturating_sub(1) });
        app.list_state.select(Some(i));
      }
    }
    KeyCode::Char('c') => {
      app.clear_results();
    }
    KeyCode::Char('/') | KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

async fn handle_video_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Char('i') => app.trigger_info(),
    KeyCode::Char('g') | KeyCode::Enter => app.trigger_process(),
    KeyCode::Char('p') => app.play_stream().await,
    KeyCode::Char(' ') => {
      if app.player.is_playing()
        && let Err(e) = app.player.toggle_pause().await
      {
        app.set_error(format!("Pause error: {}", e));
      }
    }
    KeyCode::Char('s') => {
      if app.player.is_playing() {
        app.player.stop().await.context("Failed to stop playback")?;
      }
    }
    KeyCode::Char('o') => app.open_current(),
    KeyCode::Char('w') => app.save_download(),
    KeyCode::Char('x') => app.clear_selection(),
    KeyCode::Char('/') => app.mode = AppMode::Input,
    KeyCode::Esc => {
      app.mode = if app.session.search_results().is_empty() { AppMode::Input } else { AppMode::Results };
    }
    _ => {}
  }
  Ok(())
}
