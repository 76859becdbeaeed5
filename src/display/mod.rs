//! Panel rendering contract and refresh cadence.

use crate::app::actions::Token;
use crate::artwork::Artwork;
use std::time::{Duration, Instant};

pub mod terminal;
pub mod widgets;
pub mod zones;

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("panel I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What the session controller draws with. Every method is fast and never
/// suspends; the controller calls them from its single loop.
pub trait Renderer {
    fn show_menu(&mut self) -> Result<(), DisplayError>;
    fn show_selector(&mut self) -> Result<(), DisplayError>;
    fn show_album(
        &mut self,
        title: &str,
        subtitle: &str,
        artwork: &Artwork,
    ) -> Result<(), DisplayError>;
    fn show_player(&mut self) -> Result<(), DisplayError>;
    fn update_current_track(
        &mut self,
        title: &str,
        album: &str,
        artist: &str,
        artwork: &Artwork,
    ) -> Result<(), DisplayError>;
    /// Draw the play/pause glyph. Unchanged glyphs cost no refresh.
    fn show_play_pause(&mut self, is_playing: bool) -> Result<(), DisplayError>;
    /// Run a full refresh when the cadence says one is due.
    fn refresh_if_needed(&mut self) -> Result<(), DisplayError>;
    fn is_on_player_screen(&self) -> bool;
    /// Latest unconsumed touch, hit-tested against the current screen.
    fn read_touch(&mut self) -> Option<Token>;
    /// Blank the panel before exit.
    fn cleanup(&mut self) -> Result<(), DisplayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Scheduled,
    PartialBudget,
}

/// Full-refresh bookkeeping for a panel that ghosts under partial updates.
#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    partial_limit: u32,
    interval: Duration,
    partials: u32,
    next_full: Instant,
}

impl RefreshSchedule {
    /// The first check after construction is always due.
    pub fn new(partial_limit: u32, interval: Duration, now: Instant) -> Self {
        Self {
            partial_limit,
            interval,
            partials: 0,
            next_full: now,
        }
    }

    pub fn due(&self, now: Instant) -> Option<RefreshReason> {
        if now >= self.next_full {
            Some(RefreshReason::Scheduled)
        } else if self.partial_limit > 0 && self.partials >= self.partial_limit {
            Some(RefreshReason::PartialBudget)
        } else {
            None
        }
    }

    pub fn record_full(&mut self, now: Instant) {
        self.partials = 0;
        self.next_full = now + self.interval;
    }

    pub fn record_partial(&mut self) {
        self.partials = self.partials.saturating_add(1);
    }

    pub fn partials(&self) -> u32 {
        self.partials
    }
}
