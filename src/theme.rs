use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub warning: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Crimson",
    bg: Color::Rgb(18, 18, 20),
    fg: Color::Rgb(226, 226, 230),
    accent: Color::Rgb(255, 64, 64),
    muted: Color::Rgb(120, 120, 132),
    border: Color::Rgb(62, 62, 70),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(120, 24, 28),
    stripe_bg: Color::Rgb(26, 26, 30),
    status: Color::Rgb(120, 200, 255),
    warning: Color::Rgb(255, 196, 64),
    error: Color::Rgb(255, 110, 110),
    key_fg: Color::Rgb(18, 18, 20),
    key_bg: Color::Rgb(255, 64, 64),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 242),
    fg: Color::Rgb(40, 40, 44),
    accent: Color::Rgb(200, 30, 30),
    muted: Color::Rgb(130, 126, 118),
    border: Color::Rgb(206, 200, 188),
    highlight_fg: Color::Rgb(250, 248, 242),
    highlight_bg: Color::Rgb(200, 30, 30),
    stripe_bg: Color::Rgb(242, 238, 228),
    status: Color::Rgb(30, 100, 180),
    warning: Color::Rgb(176, 110, 0),
    error: Color::Rgb(190, 20, 20),
    key_fg: Color::Rgb(250, 248, 242),
    key_bg: Color::Rgb(80, 76, 70),
  },
  Theme {
    name: "Midnight",
    bg: Color::Rgb(14, 18, 32),
    fg: Color::Rgb(210, 218, 240),
    accent: Color::Rgb(130, 170, 255),
    muted: Color::Rgb(100, 110, 140),
    border: Color::Rgb(44, 52, 80),
    highlight_fg: Color::Rgb(14, 18, 32),
    highlight_bg: Color::Rgb(130, 170, 255),
    stripe_bg: Color::Rgb(20, 25, 42),
    status: Color::Rgb(140, 220, 180),
    warning: Color::Rgb(240, 200, 100),
    error: Color::Rgb(255, 120, 140),
    key_fg: Color::Rgb(14, 18, 32),
    key_bg: Color::Rgb(130, 170, 255),
  },
];
