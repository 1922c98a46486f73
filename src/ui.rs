use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, InputTab, ToolStatus};
use crate::constants::constants;
use crate::media;
use crate::theme::Theme;
use crate::video::{format_count, format_duration};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn panel<'a>(title: impl Into<Line<'a>>, theme: &Theme, focused: bool) -> Block<'a> {
  let border = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border))
    .padding(Padding::horizontal(1))
}

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
  Line::from(vec![Span::styled(label, Style::default().fg(theme.muted)), Span::styled(value, Style::default().fg(theme.fg))])
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let [sidebar_area, content_area] = Layout::horizontal([Constraint::Length(30), Constraint::Min(20)]).areas(main_area);

  render_header(frame, theme, header_area);
  render_sidebar(frame, app, sidebar_area);
  render_content(frame, app, content_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(
    " ▶ ytsp  search · stream · download ",
    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
  ));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let settings = &app.settings;
  let inner_w = area.width.saturating_sub(4) as usize;

  let mut lines = vec![
    Line::from(Span::styled("Settings", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    field("F2 Quality   ", settings.quality.label().to_string(), theme),
    field("F3 Mode      ", settings.mode.label().to_string(), theme),
    field("F4 Results   ", settings.max_results.to_string(), theme),
    field("F5 Max size  ", format!("{} MB", settings.size_cap.mb()), theme),
    Line::from(""),
    Line::from(Span::styled("System", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
  ];

  let tool_line = match &app.tool_status {
    ToolStatus::Checking => Span::styled("yt-dlp: checking…", Style::default().fg(theme.muted)),
    ToolStatus::Available(version) => {
      Span::styled(truncate_str(&format!("yt-dlp {}", version), inner_w), Style::default().fg(theme.status))
    }
    ToolStatus::Missing => Span::styled("yt-dlp not found", Style::default().fg(theme.warning)),
  };
  lines.push(Line::from(tool_line));
  if app.tool_status == ToolStatus::Missing {
    lines.push(Line::from(Span::styled("Limited search, embed only", Style::default().fg(theme.warning))));
  }

  let player_line = match &app.player.now_playing {
    Some(np) => {
      let icon = if app.player.paused { "⏸" } else { "♪" };
      Span::styled(truncate_str(&format!("{} {}", icon, np.title), inner_w), Style::default().fg(theme.status))
    }
    None => Span::styled("mpv idle", Style::default().fg(theme.muted)),
  };
  lines.push(Line::from(player_line));

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled("Saves to", Style::default().fg(theme.muted))));
  lines.push(Line::from(Span::styled(
    truncate_str(&app.download_dir.display().to_string(), inner_w),
    Style::default().fg(theme.fg),
  )));

  let paragraph = Paragraph::new(lines).block(panel(" ytsp ", theme, false));
  frame.render_widget(paragraph, area);
}

fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.mode == AppMode::Video && app.session.selected_video().is_some() {
    render_video(frame, app, area);
  } else if !app.session.search_results().is_empty() {
    render_results(frame, app, area);
  } else {
    render_welcome(frame, app.theme(), area);
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let categories = constants().quick_categories.join(" · ");
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  YouTube search & stream", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search, stream, download. In the terminal.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a query below and press Enter, or ^u to paste a URL.", Style::default().fg(theme.muted))),
    Line::from(Span::styled("Tab cycles through suggestions:", Style::default().fg(theme.muted))),
    Line::from(Span::styled(categories, Style::default().fg(theme.fg))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .session
    .search_results()
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let views = video.view_count.map(|v| format!("{} views  ", format_count(v))).unwrap_or_default();
      let right = format!("{}{}  {}", views, truncate_str(&video.uploader, 20), format_duration(video.duration));
      let right_w = right.chars().count();
      let title = truncate_str(&video.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);

      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let count = app.session.search_results().len();
  let title = if app.session.results_limited() {
    format!(" Results: {} (limited demo catalog) ", count)
  } else {
    format!(" Results: {} ", count)
  };

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if app.mode == AppMode::Results { theme.accent } else { theme.border })),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_video(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(video) = app.session.selected_video() else { return };
  let detailed = app.session.detailed_info();
  let inner_w = area.width.saturating_sub(4) as usize;

  // Detailed metadata supersedes the search row.
  let shown = detailed.map_or(video, |d| &d.video);

  let mut lines = vec![
    Line::from(Span::styled(shown.title.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    field("Channel   ", shown.uploader.clone(), theme),
    field("Duration  ", format_duration(shown.duration), theme),
  ];
  if let Some(views) = shown.view_count {
    lines.push(field("Views     ", format_count(views), theme));
  }
  lines.push(field("URL       ", truncate_str(&shown.url, inner_w.saturating_sub(10)), theme));
  lines.push(field("Thumbnail ", truncate_str(&shown.thumbnail, inner_w.saturating_sub(10)), theme));

  if let Some(d) = detailed {
    lines.push(field("Uploaded  ", d.upload_date.clone(), theme));
    lines.push(field("Formats   ", d.formats_available.to_string(), theme));
    if !d.description.is_empty() {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(d.description.clone(), Style::default().fg(theme.muted))));
    }
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    format!("Mode: {} (g: {})", app.settings.mode.label(), app.settings.mode.action()),
    Style::default().fg(theme.accent),
  )));
  if let Some(stream_url) = app.session.stream_url() {
    lines.push(field("Stream    ", truncate_str(stream_url, inner_w.saturating_sub(10)), theme));
  }
  if let Some(bytes) = app.session.downloaded_bytes() {
    lines.push(field("Download  ", format!("{:.1} MB in memory", bytes.len() as f64 / 1024.0 / 1024.0), theme));
  }
  if let Some(id) = app.session.embed_id() {
    lines.push(field("Embed     ", media::embed_url(id), theme));
  }

  let paragraph =
    Paragraph::new(lines).wrap(Wrap { trim: false }).block(panel(" Video ", theme, app.mode == AppMode::Video));
  frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" {}", info), Style::default().fg(theme.fg))
  } else {
    match app.player.last_mpv_status() {
      Some(status) => (format!(" ♪ {}", status), Style::default().fg(theme.status)),
      None => (" Ready".to_string(), Style::default().fg(theme.muted)),
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let title = match app.input_tab {
    InputTab::Search => " Search YouTube ",
    InputTab::Url => " Video URL or ID ",
  };
  let input_block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.session.search_results().is_empty();
  let is_playing = app.player.is_playing();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = match app.input_tab {
        InputTab::Search => vec![("Enter", "Search"), ("Tab", "Suggest"), ("^u", "URL")],
        InputTab::Url => vec![("Enter", "Load"), ("^u", "Search")],
      };
      if has_results {
        k.push(("↓", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Results => vec![("Enter", "Select"), ("j/k", "Navigate"), ("c", "Clear"), ("Esc", "Search")],
    AppMode::Video => {
      let mut k = vec![("g", app.settings.mode.action()), ("i", "Info"), ("o", "Open")];
      if app.session.stream_url().is_some() {
        k.push(("p", "Play"));
      }
      if app.session.downloaded_bytes().is_some() {
        k.push(("w", "Save"));
      }
      if is_playing {
        let pause_label = if app.player.paused { "Resume" } else { "Pause" };
        k.push(("Space", pause_label));
        k.push(("s", "Stop"));
      }
      k.push(("x", "Clear"));
      k.push(("Esc", "Back"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("^t {} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
