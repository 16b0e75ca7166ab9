#![forbid(unsafe_code)]

//! Marking modes of the session.

use std::fmt;

use lightseg_core::interval::Mark;

/// What happens to the light under the cursor when the cursor moves away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionMode {
    /// Move without changing anything.
    #[default]
    Nav,
    /// Turn each light on as the cursor leaves it.
    On,
    /// Turn each light off as the cursor leaves it.
    Off,
    /// Move without marking; the strip highlights the cursor so the light can
    /// be found physically.
    Find,
}

impl ActionMode {
    /// All modes in cycling order.
    pub const ALL: [ActionMode; 4] = [
        ActionMode::Nav,
        ActionMode::On,
        ActionMode::Off,
        ActionMode::Find,
    ];

    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ActionMode::Nav => "NAV",
            ActionMode::On => "ON",
            ActionMode::Off => "OFF",
            ActionMode::Find => "FIND",
        }
    }

    /// Parse a wire label. Unknown labels yield `None`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.label() == label)
    }

    /// The mode that follows this one when cycling.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            ActionMode::Nav => ActionMode::On,
            ActionMode::On => ActionMode::Off,
            ActionMode::Off => ActionMode::Find,
            ActionMode::Find => ActionMode::Nav,
        }
    }

    /// The mark applied on movement, if this mode marks at all.
    #[must_use]
    pub const fn mark(self) -> Option<Mark> {
        match self {
            ActionMode::On => Some(Mark::On),
            ActionMode::Off => Some(Mark::Off),
            ActionMode::Nav | ActionMode::Find => None,
        }
    }
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for mode in ActionMode::ALL {
            assert_eq!(ActionMode::parse(mode.label()), Some(mode));
        }
        assert_eq!(ActionMode::parse("nav"), None);
        assert_eq!(ActionMode::parse("???"), None);
    }

    #[test]
    fn cycle_visits_every_mode() {
        let mut mode = ActionMode::default();
        let mut seen = Vec::new();
        for _ in 0..ActionMode::ALL.len() {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(seen, ActionMode::ALL);
        assert_eq!(mode, ActionMode::Nav);
    }

    #[test]
    fn only_on_and_off_mark() {
        assert_eq!(ActionMode::On.mark(), Some(Mark::On));
        assert_eq!(ActionMode::Off.mark(), Some(Mark::Off));
        assert_eq!(ActionMode::Nav.mark(), None);
        assert_eq!(ActionMode::Find.mark(), None);
    }
}
