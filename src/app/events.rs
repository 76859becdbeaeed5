/// One notification from the player's event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEvent {
    pub player_id: String,
    pub kind: PlayerEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEventKind {
    NewSong,
    Stop,
    Play,
    /// `resumed` is false when the pause was engaged.
    Pause { resumed: bool },
}

impl PlayerEventKind {
    /// Playback state this event asserts, if any. Every status-bearing event
    /// is authoritative, so a dropped event is corrected by the next one.
    pub fn playing(self) -> Option<bool> {
        match self {
            PlayerEventKind::NewSong => None,
            PlayerEventKind::Stop | PlayerEventKind::Pause { resumed: false } => Some(false),
            PlayerEventKind::Play | PlayerEventKind::Pause { resumed: true } => Some(true),
        }
    }
}
