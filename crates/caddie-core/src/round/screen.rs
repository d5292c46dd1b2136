//! Application screen state machine.
//!
//! `NoData → Welcome → ActiveRound ⇄ MainMenu`. Starting a new round is
//! reachable from every screen and always lands in `ActiveRound`. There is no
//! terminal state.

use crate::error::{CaddieError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which screen the golfer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Screen {
    /// Nothing loaded yet.
    #[default]
    NoData,
    /// Start or resume prompt.
    Welcome,
    /// Conversation with the caddie.
    ActiveRound,
    /// Navigated away from an active round.
    MainMenu,
}

/// Inputs that drive screen transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    /// Persisted data has been loaded (or found absent).
    Loaded,
    /// Go back to the current round.
    Resume,
    /// A new round has been allocated.
    StartNewRound,
    /// Leave the active round.
    GoToMainMenu,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::NoData => "NoData",
            Screen::Welcome => "Welcome",
            Screen::ActiveRound => "ActiveRound",
            Screen::MainMenu => "MainMenu",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ScreenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenEvent::Loaded => "Loaded",
            ScreenEvent::Resume => "Resume",
            ScreenEvent::StartNewRound => "StartNewRound",
            ScreenEvent::GoToMainMenu => "GoToMainMenu",
        };
        f.write_str(name)
    }
}

impl Screen {
    /// Computes the next screen.
    ///
    /// `has_current_round` gates `Resume`: there must be a round to go back to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for any event the current screen does not
    /// accept.
    pub fn transition(self, event: ScreenEvent, has_current_round: bool) -> Result<Screen> {
        use Screen::*;
        use ScreenEvent::*;

        match (self, event) {
            (_, StartNewRound) => Ok(ActiveRound),
            (NoData, Loaded) => Ok(Welcome),
            (Welcome | MainMenu, Resume) if has_current_round => Ok(ActiveRound),
            (ActiveRound, GoToMainMenu) => Ok(MainMenu),
            (from, event) => Err(CaddieError::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_goes_to_welcome() {
        assert_eq!(
            Screen::NoData.transition(ScreenEvent::Loaded, false).unwrap(),
            Screen::Welcome
        );
    }

    #[test]
    fn test_resume_requires_current_round() {
        assert!(Screen::Welcome.transition(ScreenEvent::Resume, false).is_err());
        assert_eq!(
            Screen::Welcome.transition(ScreenEvent::Resume, true).unwrap(),
            Screen::ActiveRound
        );
    }

    #[test]
    fn test_menu_round_trip() {
        let menu = Screen::ActiveRound
            .transition(ScreenEvent::GoToMainMenu, true)
            .unwrap();
        assert_eq!(menu, Screen::MainMenu);
        assert_eq!(
            menu.transition(ScreenEvent::Resume, true).unwrap(),
            Screen::ActiveRound
        );
    }

    #[test]
    fn test_new_round_from_anywhere() {
        for screen in [
            Screen::NoData,
            Screen::Welcome,
            Screen::ActiveRound,
            Screen::MainMenu,
        ] {
            assert_eq!(
                screen.transition(ScreenEvent::StartNewRound, false).unwrap(),
                Screen::ActiveRound
            );
        }
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(Screen::NoData.transition(ScreenEvent::Resume, true).is_err());
        assert!(Screen::Welcome.transition(ScreenEvent::GoToMainMenu, true).is_err());
        assert!(Screen::ActiveRound.transition(ScreenEvent::Loaded, true).is_err());
    }
}
