use super::state::ScreenState;

/// Semantic name of a touch zone. The same token means different things on
/// different screens, see [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Selector,
    Player,
    LaunchPlayer,
    PreviousAlbum,
    NextAlbum,
    ReturnMenu,
    NextTrack,
    PreviousTrack,
    PlayPause,
}

impl Token {
    #[cfg(test)]
    pub const ALL: [Token; 9] = [
        Token::Selector,
        Token::Player,
        Token::LaunchPlayer,
        Token::PreviousAlbum,
        Token::NextAlbum,
        Token::ReturnMenu,
        Token::NextTrack,
        Token::PreviousTrack,
        Token::PlayPause,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Token::Selector => "selector",
            Token::Player => "player",
            Token::LaunchPlayer => "launch_player",
            Token::PreviousAlbum => "previous_album",
            Token::NextAlbum => "next_album",
            Token::ReturnMenu => "return_menu",
            Token::NextTrack => "next_track",
            Token::PreviousTrack => "previous_track",
            Token::PlayPause => "play_pause",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowFavorites,
    ShowPlayer,
    LaunchFavorite,
    PreviousFavorite,
    NextFavorite,
    ShowMenu,
    NextTrack,
    PreviousTrack,
    TogglePlayback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub next: ScreenState,
}

use Action as A;
use ScreenState as S;

const TRANSITIONS: &[(S, Token, A, S)] = &[
    (S::Menu, Token::Selector, A::ShowFavorites, S::Selector),
    (S::Menu, Token::Player, A::ShowPlayer, S::Player),
    (S::Selector, Token::LaunchPlayer, A::LaunchFavorite, S::Player),
    (S::Selector, Token::PreviousAlbum, A::PreviousFavorite, S::Selector),
    (S::Selector, Token::NextAlbum, A::NextFavorite, S::Selector),
    (S::Selector, Token::ReturnMenu, A::ShowMenu, S::Menu),
    (S::Player, Token::ReturnMenu, A::ShowMenu, S::Menu),
    (S::Player, Token::Selector, A::ShowFavorites, S::Selector),
    (S::Player, Token::NextTrack, A::NextTrack, S::Player),
    (S::Player, Token::PreviousTrack, A::PreviousTrack, S::Player),
    (S::Player, Token::PlayPause, A::TogglePlayback, S::Player),
];

/// Look up what `token` does on `screen`; `None` means the token is ignored.
pub fn transition(screen: ScreenState, token: Token) -> Option<Transition> {
    TRANSITIONS
        .iter()
        .find(|(s, t, _, _)| *s == screen && *t == token)
        .map(|&(_, _, action, next)| Transition { action, next })
}

/// Tokens that do something on `screen`, in table order.
#[cfg(test)]
pub fn valid_tokens(screen: ScreenState) -> Vec<Token> {
    TRANSITIONS
        .iter()
        .filter(|(s, ..)| *s == screen)
        .map(|(_, t, ..)| *t)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicate_keys() {
        for (i, (s, t, ..)) in TRANSITIONS.iter().enumerate() {
            let dupes = TRANSITIONS[i + 1..]
                .iter()
                .filter(|(s2, t2, ..)| s2 == s && t2 == t)
                .count();
            assert_eq!(dupes, 0, "duplicate entry for {s:?}/{t}");
        }
    }

    #[test]
    fn test_return_menu_is_unconditional() {
        for screen in [S::Selector, S::Player] {
            let t = transition(screen, Token::ReturnMenu).unwrap();
            assert_eq!(t.action, A::ShowMenu);
            assert_eq!(t.next, S::Menu);
        }
    }

    #[test]
    fn test_screen_scoped_tokens() {
        assert_eq!(valid_tokens(S::Menu), vec![Token::Selector, Token::Player]);
        assert!(transition(S::Menu, Token::PlayPause).is_none());
        assert!(transition(S::Selector, Token::Selector).is_none());
        assert!(transition(S::Player, Token::NextAlbum).is_none());
    }

    #[test]
    fn test_token_names() {
        let names: Vec<&str> = Token::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "selector",
                "player",
                "launch_player",
                "previous_album",
                "next_album",
                "return_menu",
                "next_track",
                "previous_track",
                "play_pause",
            ]
        );
    }
}
