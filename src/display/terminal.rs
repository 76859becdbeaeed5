use crate::app::actions::Token;
use crate::app::state::ScreenState;
use crate::artwork::Artwork;
use crate::config::DisplayConfig;
use crate::display::widgets::{self, Canvas, Content};
use crate::display::{DisplayError, RefreshSchedule, Renderer, zones};
use crate::input::TouchSample;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info};

pub type PanelTerminal = Terminal<CrosstermBackend<Stdout>>;

pub struct TerminalGuard {
    terminal: PanelTerminal,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self, DisplayError> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut PanelTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; don't panic in Drop.
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}

/// The 250x122 panel emulated on the controlling terminal. A full refresh
/// clears the terminal before drawing; a partial refresh lets ratatui diff.
pub struct TerminalPanel {
    guard: TerminalGuard,
    canvas: Canvas,
    schedule: RefreshSchedule,
    touch: watch::Receiver<Option<TouchSample>>,
}

impl TerminalPanel {
    pub fn open(
        cfg: &DisplayConfig,
        touch: watch::Receiver<Option<TouchSample>>,
    ) -> Result<Self, DisplayError> {
        let guard = TerminalGuard::enter()?;
        info!(
            partial_limit = cfg.partial_update_count,
            full_refresh_hours = cfg.full_refresh_hours,
            "terminal panel opened"
        );
        Ok(Self {
            guard,
            canvas: Canvas::default(),
            schedule: RefreshSchedule::new(
                cfg.partial_update_count,
                cfg.full_refresh_interval(),
                Instant::now(),
            ),
            touch,
        })
    }

    fn draw(&mut self) -> Result<(), DisplayError> {
        let canvas = &self.canvas;
        self.guard
            .terminal_mut()
            .draw(|f| widgets::render(f, canvas))?;
        Ok(())
    }

    fn partial_refresh(&mut self) -> Result<(), DisplayError> {
        self.draw()?;
        self.schedule.record_partial();
        Ok(())
    }

    fn full_refresh(&mut self) -> Result<(), DisplayError> {
        self.guard.terminal_mut().clear()?;
        self.draw()?;
        self.schedule.record_full(Instant::now());
        Ok(())
    }

    fn show_screen(&mut self, screen: ScreenState) -> Result<(), DisplayError> {
        self.canvas = Canvas::base(screen);
        self.partial_refresh()
    }
}

impl Renderer for TerminalPanel {
    fn show_menu(&mut self) -> Result<(), DisplayError> {
        self.show_screen(ScreenState::Menu)
    }

    fn show_selector(&mut self) -> Result<(), DisplayError> {
        self.show_screen(ScreenState::Selector)
    }

    fn show_album(
        &mut self,
        title: &str,
        subtitle: &str,
        artwork: &Artwork,
    ) -> Result<(), DisplayError> {
        debug!(title, fallback_art = artwork.is_fallback(), "album");
        self.canvas.content = Content::Album {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            artwork: artwork.clone(),
        };
        self.partial_refresh()
    }

    fn show_player(&mut self) -> Result<(), DisplayError> {
        self.show_screen(ScreenState::Player)
    }

    fn update_current_track(
        &mut self,
        title: &str,
        album: &str,
        artist: &str,
        artwork: &Artwork,
    ) -> Result<(), DisplayError> {
        debug!(title, fallback_art = artwork.is_fallback(), "track");
        self.canvas.content = Content::Track {
            title: title.to_string(),
            album: album.to_string(),
            artist: artist.to_string(),
            artwork: artwork.clone(),
        };
        self.partial_refresh()
    }

    fn show_play_pause(&mut self, is_playing: bool) -> Result<(), DisplayError> {
        if !self.canvas.set_playing(is_playing) {
            return Ok(());
        }
        self.partial_refresh()
    }

    fn refresh_if_needed(&mut self) -> Result<(), DisplayError> {
        if let Some(reason) = self.schedule.due(Instant::now()) {
            debug!(?reason, partials = self.schedule.partials(), "full refresh");
            self.full_refresh()?;
        }
        Ok(())
    }

    fn is_on_player_screen(&self) -> bool {
        !self.canvas.blank && self.canvas.screen == ScreenState::Player
    }

    fn read_touch(&mut self) -> Option<Token> {
        if !self.touch.has_changed().unwrap_or(false) {
            return None;
        }
        let sample = (*self.touch.borrow_and_update())?;
        let token = zones::hit_test(self.canvas.screen, sample.x, sample.y);
        debug!(x = sample.x, y = sample.y, token = ?token, "touch");
        token
    }

    fn cleanup(&mut self) -> Result<(), DisplayError> {
        self.canvas = Canvas::blank();
        self.full_refresh()
    }
}
