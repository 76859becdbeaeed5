//! Touch sampling from the terminal.
//!
//! A left mouse press stands in for a finger on the panel. The sampler only
//! ever publishes the latest sample; the renderer decides what it means.

use crate::display::widgets::to_panel;
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEventKind,
};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SAMPLE_PERIOD: Duration = Duration::from_millis(50);

/// A touch point in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    pub x: u16,
    pub y: u16,
}

pub fn is_quit_key(k: &KeyEvent) -> bool {
    if k.kind != KeyEventKind::Press {
        return false;
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => k.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Translate one terminal event given the current grid size.
pub fn map_event(ev: &CtEvent, cols: u16, rows: u16) -> Option<Sampled> {
    match ev {
        CtEvent::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
            let (x, y) = to_panel(m.column, m.row, cols, rows);
            Some(Sampled::Touch(TouchSample { x, y }))
        }
        CtEvent::Key(k) if is_quit_key(k) => Some(Sampled::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampled {
    Touch(TouchSample),
    Quit,
}

/// Poll the terminal every 50 ms without blocking the runtime. Ends when the
/// renderer drops its receiver or after raising `quit`.
pub fn spawn_touch_sampler(
    touch: watch::Sender<Option<TouchSample>>,
    quit: watch::Sender<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SAMPLE_PERIOD);
        loop {
            ticker.tick().await;
            if touch.is_closed() {
                break;
            }
            match drain_pending() {
                Ok(sampled) => {
                    for s in sampled {
                        match s {
                            Sampled::Touch(sample) => {
                                debug!(x = sample.x, y = sample.y, "touch sampled");
                                touch.send_replace(Some(sample));
                            }
                            Sampled::Quit => {
                                let _ = quit.send(true);
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("terminal input failed: {e}");
                    let _ = quit.send(true);
                    return;
                }
            }
        }
        debug!("touch sampler stopped");
    })
}

fn drain_pending() -> std::io::Result<Vec<Sampled>> {
    let mut out = Vec::new();
    while event::poll(Duration::ZERO)? {
        let ev = event::read()?;
        let (cols, rows) = crossterm::terminal::size()?;
        out.extend(map_event(&ev, cols, rows));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> CtEvent {
        CtEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CtEvent {
        CtEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_quit_keys() {
        for ev in [
            key(KeyCode::Char('q'), KeyModifiers::NONE),
            key(KeyCode::Esc, KeyModifiers::NONE),
            key(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(map_event(&ev, 80, 24), Some(Sampled::Quit));
        }
        assert_eq!(map_event(&key(KeyCode::Char('c'), KeyModifiers::NONE), 80, 24), None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = CtEvent::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&release, 80, 24), None);
    }

    #[test]
    fn test_left_press_maps_to_panel_coordinates() {
        let ev = mouse(MouseEventKind::Down(MouseButton::Left), 40, 12);
        assert_eq!(
            map_event(&ev, 80, 24),
            Some(Sampled::Touch(TouchSample { x: 125, y: 61 }))
        );
    }

    #[test]
    fn test_other_mouse_events_are_ignored() {
        assert_eq!(map_event(&mouse(MouseEventKind::Moved, 1, 1), 80, 24), None);
        assert_eq!(
            map_event(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 1), 80, 24),
            None
        );
        assert_eq!(
            map_event(&mouse(MouseEventKind::Up(MouseButton::Left), 1, 1), 80, 24),
            None
        );
    }
}
