//! Touch zones per screen, in panel coordinates.
//!
//! The panel is 250x122 in landscape, origin at the top-left corner. Bounds
//! are inclusive. The same table drives hit-testing and the button labels
//! drawn on screen, so what the user sees is what they can press.

use crate::app::actions::Token;
use crate::app::state::ScreenState;

pub const PANEL_WIDTH: u16 = 250;
pub const PANEL_HEIGHT: u16 = 122;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Area {
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TouchZone {
    pub token: Token,
    pub area: Area,
    /// Empty when the zone is the content itself rather than a button.
    pub label: &'static str,
}

const fn zone(token: Token, area: Area, label: &'static str) -> TouchZone {
    TouchZone { token, area, label }
}

const MENU: &[TouchZone] = &[
    zone(Token::Player, Area::new(11, 30, 109, 91), "Now Playing"),
    zone(Token::Selector, Area::new(131, 11, 239, 111), "Favorites"),
];

const SELECTOR: &[TouchZone] = &[
    zone(Token::LaunchPlayer, Area::new(0, 0, 249, 75), ""),
    zone(Token::PreviousAlbum, Area::new(40, 80, 90, 121), "<"),
    zone(Token::ReturnMenu, Area::new(100, 80, 150, 121), "Menu"),
    zone(Token::NextAlbum, Area::new(160, 80, 210, 121), ">"),
];

const PLAYER: &[TouchZone] = &[
    zone(Token::Selector, Area::new(0, 80, 40, 121), "Favs"),
    zone(Token::ReturnMenu, Area::new(50, 80, 95, 121), "Menu"),
    zone(Token::PreviousTrack, Area::new(105, 80, 150, 121), "|<<"),
    zone(Token::PlayPause, Area::new(158, 80, 203, 121), ""),
    zone(Token::NextTrack, Area::new(210, 80, 249, 121), ">>|"),
];

pub fn zones(screen: ScreenState) -> &'static [TouchZone] {
    match screen {
        ScreenState::Menu => MENU,
        ScreenState::Selector => SELECTOR,
        ScreenState::Player => PLAYER,
    }
}

/// First zone of `screen` containing the point.
pub fn hit_test(screen: ScreenState, x: u16, y: u16) -> Option<Token> {
    zones(screen)
        .iter()
        .find(|z| z.area.contains(x, y))
        .map(|z| z.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::actions::transition;

    #[test]
    fn test_every_zone_token_has_a_transition() {
        for screen in [ScreenState::Menu, ScreenState::Selector, ScreenState::Player] {
            for z in zones(screen) {
                assert!(
                    transition(screen, z.token).is_some(),
                    "{screen:?} zone {} does nothing",
                    z.token
                );
            }
        }
    }

    #[test]
    fn test_zones_fit_the_panel_and_do_not_overlap() {
        for screen in [ScreenState::Menu, ScreenState::Selector, ScreenState::Player] {
            let list = zones(screen);
            for (i, a) in list.iter().enumerate() {
                assert!(a.area.x0 <= a.area.x1 && a.area.x1 < PANEL_WIDTH);
                assert!(a.area.y0 <= a.area.y1 && a.area.y1 < PANEL_HEIGHT);
                for b in &list[i + 1..] {
                    let disjoint = a.area.x1 < b.area.x0
                        || b.area.x1 < a.area.x0
                        || a.area.y1 < b.area.y0
                        || b.area.y1 < a.area.y0;
                    assert!(disjoint, "{screen:?}: {} overlaps {}", a.token, b.token);
                }
            }
        }
    }

    #[test]
    fn test_hit_test_menu() {
        assert_eq!(hit_test(ScreenState::Menu, 60, 60), Some(Token::Player));
        assert_eq!(hit_test(ScreenState::Menu, 180, 60), Some(Token::Selector));
        assert_eq!(hit_test(ScreenState::Menu, 120, 60), None);
        assert_eq!(hit_test(ScreenState::Menu, 60, 5), None);
    }

    #[test]
    fn test_hit_test_selector_strip() {
        let s = ScreenState::Selector;
        assert_eq!(hit_test(s, 10, 10), Some(Token::LaunchPlayer));
        assert_eq!(hit_test(s, 60, 100), Some(Token::PreviousAlbum));
        assert_eq!(hit_test(s, 125, 100), Some(Token::ReturnMenu));
        assert_eq!(hit_test(s, 185, 100), Some(Token::NextAlbum));
        assert_eq!(hit_test(s, 95, 100), None);
        assert_eq!(hit_test(s, 125, 77), None);
    }

    #[test]
    fn test_hit_test_player_strip_edges() {
        let s = ScreenState::Player;
        assert_eq!(hit_test(s, 0, 121), Some(Token::Selector));
        assert_eq!(hit_test(s, 50, 80), Some(Token::ReturnMenu));
        assert_eq!(hit_test(s, 150, 100), Some(Token::PreviousTrack));
        assert_eq!(hit_test(s, 180, 100), Some(Token::PlayPause));
        assert_eq!(hit_test(s, 249, 121), Some(Token::NextTrack));
        assert_eq!(hit_test(s, 180, 40), None);
    }
}
