#![forbid(unsafe_code)]

//! Key bindings for the segmenter.
//!
//! | Key | Action |
//! |-----|--------|
//! | `Right` | [`Action::Up`] |
//! | `Left` | [`Action::Down`] |
//! | `Shift+Right`, `PageUp` | [`Action::FastUp`] |
//! | `Shift+Left`, `PageDown` | [`Action::FastDown`] |
//! | `Home` / `End` | [`Action::JumpToStart`] / [`Action::JumpToEnd`] |
//! | `Space` | [`Action::CycleMode`] |
//! | `s`, `Enter` | [`Action::Save`] |
//! | `q`, `Esc`, `Ctrl+C` | [`Action::Quit`] |
//!
//! Release events never produce an action, so a key press is not applied twice
//! on terminals that report both edges.

use crate::input::{KeyCode, KeyEvent, KeyEventKind};
use crate::interval::Point;

/// How far the fast-move actions travel.
pub const FAST_STEP: Point = 10;

/// A user intent, independent of how it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the cursor one position up.
    Up,
    /// Move the cursor one position down.
    Down,
    /// Move the cursor [`FAST_STEP`] positions up.
    FastUp,
    /// Move the cursor [`FAST_STEP`] positions down.
    FastDown,
    /// Put the cursor on a specific position.
    JumpTo(Point),
    /// Put the cursor on the lowest valid position.
    JumpToStart,
    /// Put the cursor on the highest valid position.
    JumpToEnd,
    /// Advance to the next marking mode.
    CycleMode,
    /// Persist the current state.
    Save,
    /// Leave the tool.
    Quit,
}

impl Action {
    /// Look up the action bound to `event`.
    #[must_use]
    pub fn from_key(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let action = match event.code {
            KeyCode::Right if event.shift() => Action::FastUp,
            KeyCode::Left if event.shift() => Action::FastDown,
            KeyCode::Right => Action::Up,
            KeyCode::Left => Action::Down,
            KeyCode::PageUp => Action::FastUp,
            KeyCode::PageDown => Action::FastDown,
            KeyCode::Home => Action::JumpToStart,
            KeyCode::End => Action::JumpToEnd,
            KeyCode::Char('c') if event.ctrl() => Action::Quit,
            KeyCode::Char(' ') => Action::CycleMode,
            KeyCode::Char('s') | KeyCode::Enter => Action::Save,
            KeyCode::Char('q') | KeyCode::Escape => Action::Quit,
            _ => return None,
        };
        Some(action)
    }

    /// Signed cursor displacement for movement actions.
    #[must_use]
    pub const fn step(&self) -> Option<Point> {
        match self {
            Action::Up => Some(1),
            Action::Down => Some(-1),
            Action::FastUp => Some(FAST_STEP),
            Action::FastDown => Some(-FAST_STEP),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    #[test]
    fn arrows_move() {
        assert_eq!(Action::from_key(&press(KeyCode::Right)), Some(Action::Up));
        assert_eq!(Action::from_key(&press(KeyCode::Left)), Some(Action::Down));
    }

    #[test]
    fn shifted_arrows_move_fast() {
        let right = press(KeyCode::Right).with_modifiers(Modifiers::SHIFT);
        let left = press(KeyCode::Left).with_modifiers(Modifiers::SHIFT);
        assert_eq!(Action::from_key(&right), Some(Action::FastUp));
        assert_eq!(Action::from_key(&left), Some(Action::FastDown));
        assert_eq!(Action::from_key(&press(KeyCode::PageUp)), Some(Action::FastUp));
    }

    #[test]
    fn space_cycles_mode() {
        assert_eq!(
            Action::from_key(&press(KeyCode::Char(' '))),
            Some(Action::CycleMode)
        );
    }

    #[test]
    fn quit_bindings() {
        let ctrl_c = press(KeyCode::Char('c')).with_modifiers(Modifiers::CTRL);
        assert_eq!(Action::from_key(&ctrl_c), Some(Action::Quit));
        assert_eq!(Action::from_key(&press(KeyCode::Escape)), Some(Action::Quit));
        assert_eq!(Action::from_key(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn release_is_ignored() {
        let release = press(KeyCode::Right).with_kind(KeyEventKind::Release);
        assert_eq!(Action::from_key(&release), None);
        let repeat = press(KeyCode::Right).with_kind(KeyEventKind::Repeat);
        assert_eq!(Action::from_key(&repeat), Some(Action::Up));
    }

    #[test]
    fn steps() {
        assert_eq!(Action::FastDown.step(), Some(-FAST_STEP));
        assert_eq!(Action::Save.step(), None);
    }
}
