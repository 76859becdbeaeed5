//! Session controller: the navigation and playback state machine.
//!
//! One loop owns all state. Each iteration drains the player events queued
//! so far, lets the panel run a due full refresh, keeps the play/pause glyph
//! in sync and handles at most one touch. Player failures are logged and the
//! loop carries on; panel failures end the session.

pub mod actions;
pub mod events;
pub mod state;

use crate::display::{DisplayError, Renderer};
use crate::lms::{PlayerClient, PlayerError};
use actions::{Action, Token, transition};
use events::{PlayerEvent, PlayerEventKind};
use state::{PlaybackStatus, ScreenState, SessionState};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const LOOP_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

pub struct Session<P, R> {
    player: P,
    renderer: R,
    events: mpsc::Receiver<PlayerEvent>,
    state: SessionState,
}

impl<P: PlayerClient, R: Renderer> Session<P, R> {
    pub fn new(player: P, renderer: R, events: mpsc::Receiver<PlayerEvent>) -> Self {
        Self {
            player,
            renderer,
            events,
            state: SessionState::default(),
        }
    }

    /// Load favorites and the current track, then show the menu.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.reload_favorites().await;
        if let Err(e) = self.refresh_track().await {
            warn!("could not read the current track: {e}");
        }
        self.state.screen = ScreenState::Menu;
        self.renderer.show_menu()?;
        Ok(())
    }

    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), SessionError> {
        info!("session running");
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.step().await {
                Ok(()) => {}
                Err(SessionError::Player(e)) => warn!("player request failed: {e}"),
                Err(e) => return Err(e),
            }
            tokio::select! {
                _ = tokio::time::sleep(LOOP_INTERVAL) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("session stopping");
        Ok(())
    }

    /// Blank the panel. Errors are logged, there is nothing left to do.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.renderer.cleanup() {
            warn!("panel cleanup failed: {e}");
        }
    }

    /// One loop iteration.
    pub async fn step(&mut self) -> Result<(), SessionError> {
        // Only what is queued now; events arriving meanwhile wait a turn.
        // A failed refresh returns early and leaves the rest queued for the
        // next iteration.
        for _ in 0..self.events.len() {
            let Ok(event) = self.events.try_recv() else {
                break;
            };
            self.apply_event(event).await?;
        }

        self.renderer.refresh_if_needed()?;
        if self.renderer.is_on_player_screen() {
            self.renderer
                .show_play_pause(self.state.playback.is_playing())?;
        }

        if let Some(token) = self.renderer.read_touch() {
            self.handle_touch(token).await?;
        }
        Ok(())
    }

    pub async fn apply_event(&mut self, event: PlayerEvent) -> Result<(), SessionError> {
        debug!(kind = ?event.kind, "player event");
        if let Some(playing) = event.kind.playing() {
            self.state.playback = PlaybackStatus::from_playing(playing);
        }
        if event.kind == PlayerEventKind::NewSong {
            self.refresh_track().await?;
            if self.renderer.is_on_player_screen() {
                self.draw_track()?;
            }
        }
        Ok(())
    }

    pub async fn handle_touch(&mut self, token: Token) -> Result<(), SessionError> {
        let screen = self.state.screen;
        let Some(t) = transition(screen, token) else {
            debug!(%token, ?screen, "token ignored");
            return Ok(());
        };
        debug!(%token, ?screen, action = ?t.action, "touch");

        match t.action {
            Action::ShowFavorites => {
                if self.state.favorites.is_empty() {
                    self.reload_favorites().await;
                }
                self.enter_selector()?;
            }
            Action::ShowPlayer => {
                let refresh = self.state.track.is_none();
                self.enter_player(refresh).await?;
            }
            Action::LaunchFavorite => {
                let Some(url) = self.state.favorites.current().map(|f| f.url.clone()) else {
                    debug!("no favorites to launch");
                    return Ok(());
                };
                info!(%url, "launching favorite");
                self.player.load_url(&url).await?;
                self.enter_player(true).await?;
            }
            Action::PreviousFavorite => {
                if self.state.favorites.select_prev() {
                    self.draw_album()?;
                }
            }
            Action::NextFavorite => {
                if self.state.favorites.select_next() {
                    self.draw_album()?;
                }
            }
            Action::ShowMenu => {
                self.state.screen = ScreenState::Menu;
                self.renderer.show_menu()?;
            }
            Action::NextTrack => {
                self.player.next().await?;
                self.refresh_track().await?;
                self.draw_track()?;
            }
            Action::PreviousTrack => {
                self.player.previous().await?;
                self.refresh_track().await?;
                self.draw_track()?;
            }
            Action::TogglePlayback => {
                if self.state.playback.is_playing() {
                    self.player.pause().await?;
                } else {
                    self.player.play().await?;
                }
                // The event feed confirms or corrects this shortly.
                self.state.playback = self.state.playback.toggled();
                self.renderer
                    .show_play_pause(self.state.playback.is_playing())?;
            }
        }
        Ok(())
    }

    fn enter_selector(&mut self) -> Result<(), SessionError> {
        self.state.screen = ScreenState::Selector;
        debug!(
            favorites = self.state.favorites.len(),
            cursor = self.state.favorites.cursor(),
            "selector"
        );
        self.renderer.show_selector()?;
        self.draw_album()
    }

    async fn enter_player(&mut self, refresh: bool) -> Result<(), SessionError> {
        self.state.screen = ScreenState::Player;
        self.renderer.show_player()?;
        if refresh && let Err(e) = self.refresh_track().await {
            warn!("could not read the current track: {e}");
        }
        self.draw_track()
    }

    /// `None` from the server keeps whatever track we already had.
    async fn refresh_track(&mut self) -> Result<(), PlayerError> {
        if let Some(track) = self.player.refresh_current_track().await? {
            self.state.track = Some(track);
        }
        Ok(())
    }

    async fn reload_favorites(&mut self) {
        match self.player.list_favorites().await {
            Ok(entries) => {
                info!(count = entries.len(), "favorites loaded");
                self.state.favorites.replace(entries);
            }
            Err(e) => {
                warn!("could not load favorites: {e}");
                self.state.favorites.replace(Vec::new());
            }
        }
    }

    fn draw_album(&mut self) -> Result<(), SessionError> {
        if let Some(f) = self.state.favorites.current() {
            self.renderer.show_album(&f.title, &f.subtitle, &f.artwork)?;
        }
        Ok(())
    }

    fn draw_track(&mut self) -> Result<(), SessionError> {
        if let Some(t) = &self.state.track {
            self.renderer
                .update_current_track(&t.title, &t.album, &t.artist, &t.artwork)?;
        }
        Ok(())
    }
}
