use crate::lms::models::{FavoriteEntry, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenState {
    #[default]
    Menu,
    Selector,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    #[default]
    Paused,
}

impl PlaybackStatus {
    pub fn from_playing(playing: bool) -> Self {
        if playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }

    pub fn toggled(self) -> Self {
        Self::from_playing(!self.is_playing())
    }
}

/// Favorites with the selector cursor. The cursor stays inside
/// `[0, len-1]`; on an empty list it sits at 0 and moves are no-ops.
#[derive(Debug, Clone, Default)]
pub struct FavoriteList {
    entries: Vec<FavoriteEntry>,
    cursor: usize,
}

impl FavoriteList {
    /// Swap in a freshly loaded sequence; the cursor goes back to the start.
    pub fn replace(&mut self, entries: Vec<FavoriteEntry>) {
        self.entries = entries;
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&FavoriteEntry> {
        self.entries.get(self.cursor)
    }

    /// Returns true when the cursor moved.
    pub fn select_prev(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Returns true when the cursor moved.
    pub fn select_next(&mut self) -> bool {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}

/// Everything the session controller owns.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub screen: ScreenState,
    pub playback: PlaybackStatus,
    pub track: Option<Track>,
    pub favorites: FavoriteList,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::Artwork;
    use crate::lms::models::FavoriteKind;

    fn entry(n: usize) -> FavoriteEntry {
        FavoriteEntry {
            kind: FavoriteKind::Album,
            title: format!("Album {n}"),
            subtitle: "Artist".to_string(),
            artwork: Artwork::fallback(),
            url: format!("spotify:album:{n}"),
        }
    }

    #[test]
    fn test_cursor_clamps_at_both_ends() {
        let mut list = FavoriteList::default();
        list.replace((0..3).map(entry).collect());

        assert!(!list.select_prev());
        assert_eq!(list.cursor(), 0);
        assert!(list.select_next());
        assert!(list.select_next());
        assert!(!list.select_next());
        assert_eq!(list.cursor(), 2);
        assert_eq!(list.current().unwrap().url, "spotify:album:2");
    }

    #[test]
    fn test_empty_list_moves_are_noops() {
        let mut list = FavoriteList::default();
        assert!(!list.select_next());
        assert!(!list.select_prev());
        assert_eq!(list.cursor(), 0);
        assert!(list.current().is_none());
    }

    #[test]
    fn test_replace_resets_cursor() {
        let mut list = FavoriteList::default();
        list.replace((0..3).map(entry).collect());
        list.select_next();
        list.replace(vec![entry(9)]);
        assert_eq!(list.cursor(), 0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_playback_toggle() {
        assert_eq!(PlaybackStatus::default(), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::Paused.toggled(), PlaybackStatus::Playing);
        assert!(!PlaybackStatus::Playing.toggled().is_playing());
    }
}
