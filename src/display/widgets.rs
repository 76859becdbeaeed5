//! Panel layout drawn on a terminal grid.
//!
//! Everything is positioned in panel coordinates and scaled onto whatever
//! cell grid the terminal offers, ink on paper.

use crate::app::actions::Token;
use crate::app::state::ScreenState;
use crate::artwork::Artwork;
use crate::display::zones::{self, Area, PANEL_HEIGHT, PANEL_WIDTH};
use image::imageops::FilterType;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph},
};

const PAPER: Color = Color::White;
const INK: Color = Color::Black;

const PLAYING_GLYPH: &str = "▶";
const PAUSED_GLYPH: &str = "❚❚";

const ARTWORK_AREA: Area = Area::new(2, 2, 76, 76);
const TEXT_LEFT: u16 = 82;
const TEXT_RIGHT: u16 = 247;
const LINE_HEIGHT: u16 = 16;

#[derive(Debug, Clone, Default)]
pub enum Content {
    #[default]
    Empty,
    Album {
        title: String,
        subtitle: String,
        artwork: Artwork,
    },
    Track {
        title: String,
        album: String,
        artist: String,
        artwork: Artwork,
    },
}

/// What is currently on the panel.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    pub screen: ScreenState,
    pub content: Content,
    /// Glyph state last drawn; `None` until the first draw on a Player screen.
    pub playing: Option<bool>,
    pub blank: bool,
}

impl Canvas {
    /// A fresh screen with its buttons and nothing else.
    pub fn base(screen: ScreenState) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    pub fn blank() -> Self {
        Self {
            blank: true,
            ..Self::default()
        }
    }

    /// Returns false when the glyph already shows this state.
    pub fn set_playing(&mut self, playing: bool) -> bool {
        if self.playing == Some(playing) {
            return false;
        }
        self.playing = Some(playing);
        true
    }
}

pub fn glyph(playing: bool) -> &'static str {
    if playing { PLAYING_GLYPH } else { PAUSED_GLYPH }
}

fn paper() -> Style {
    Style::default().fg(INK).bg(PAPER)
}

/// Map a panel area onto terminal cells inside `frame`. Never returns an
/// empty rect for a non-empty frame.
pub fn to_cells(frame: Rect, area: Area) -> Rect {
    let scale_x = |px: u16| (u32::from(px) * u32::from(frame.width) / u32::from(PANEL_WIDTH)) as u16;
    let scale_y =
        |py: u16| (u32::from(py) * u32::from(frame.height) / u32::from(PANEL_HEIGHT)) as u16;

    let x = scale_x(area.x0).min(frame.width.saturating_sub(1));
    let y = scale_y(area.y0).min(frame.height.saturating_sub(1));
    let right = scale_x(area.x1 + 1).min(frame.width);
    let bottom = scale_y(area.y1 + 1).min(frame.height);
    Rect::new(
        frame.x + x,
        frame.y + y,
        right.saturating_sub(x).max(1),
        bottom.saturating_sub(y).max(1),
    )
}

/// Map a terminal cell back to panel coordinates.
pub fn to_panel(col: u16, row: u16, cols: u16, rows: u16) -> (u16, u16) {
    if cols == 0 || rows == 0 {
        return (0, 0);
    }
    let x = u32::from(col) * u32::from(PANEL_WIDTH) / u32::from(cols);
    let y = u32::from(row) * u32::from(PANEL_HEIGHT) / u32::from(rows);
    (
        (x as u16).min(PANEL_WIDTH - 1),
        (y as u16).min(PANEL_HEIGHT - 1),
    )
}

/// Two-tone thumbnail where each cell holds two vertical pixels.
pub fn halfblock(artwork: &Artwork, cols: u16, rows: u16) -> Vec<String> {
    if cols == 0 || rows == 0 {
        return Vec::new();
    }
    let thumb = artwork
        .image()
        .resize_exact(u32::from(cols), u32::from(rows) * 2, FilterType::Triangle)
        .to_luma8();
    let dark = |x: u32, y: u32| thumb.get_pixel(x, y)[0] < 128;

    (0..u32::from(rows))
        .map(|row| {
            (0..u32::from(cols))
                .map(|col| match (dark(col, row * 2), dark(col, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect::<String>()
        })
        .collect()
}

pub fn render(frame: &mut Frame, canvas: &Canvas) {
    let area = frame.area();
    frame.render_widget(Block::default().style(paper()), area);
    if canvas.blank || area.width == 0 || area.height == 0 {
        return;
    }

    match &canvas.content {
        Content::Empty => {}
        Content::Album {
            title,
            subtitle,
            artwork,
        } => {
            render_artwork(frame, area, artwork);
            render_text(frame, area, 20, title, true);
            render_text(frame, area, 44, subtitle, false);
        }
        Content::Track {
            title,
            album,
            artist,
            artwork,
        } => {
            render_artwork(frame, area, artwork);
            render_text(frame, area, 6, title, true);
            render_text(frame, area, 30, album, false);
            render_text(frame, area, 54, artist, false);
        }
    }

    for zone in zones::zones(canvas.screen) {
        let label = match zone.token {
            Token::PlayPause => canvas.playing.map(glyph).unwrap_or(""),
            _ if zone.label.is_empty() => continue,
            _ => zone.label,
        };
        let button = Paragraph::new(label)
            .alignment(Alignment::Center)
            .block(Block::bordered().style(paper()));
        frame.render_widget(button, to_cells(area, zone.area));
    }
}

fn render_artwork(frame: &mut Frame, area: Rect, artwork: &Artwork) {
    let rect = to_cells(area, ARTWORK_AREA);
    let lines: Vec<Line> = halfblock(artwork, rect.width, rect.height)
        .into_iter()
        .map(Line::from)
        .collect();
    frame.render_widget(Paragraph::new(lines).style(paper()), rect);
}

fn render_text(frame: &mut Frame, area: Rect, top: u16, text: &str, bold: bool) {
    let rect = to_cells(area, Area::new(TEXT_LEFT, top, TEXT_RIGHT, top + LINE_HEIGHT));
    let mut style = paper();
    if bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    let line = Line::styled(truncate_str(text, rect.width as usize), style);
    frame.render_widget(Paragraph::new(line), rect);
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
