#![forbid(unsafe_code)]

//! The marking session: cursor, mode, and the set of lit positions.
//!
//! A [`Session`] owns one [`IntervalSet`] and mutates it in response to
//! [`Action`]s. Every state change yields an [`Outbound`] request carrying a
//! full snapshot; the caller decides how (and whether) to deliver it.
//!
//! # Movement
//!
//! Moving the cursor first applies the current mode to the position being
//! left, then moves, clamped to `[min_point, max_point]`. A move that starts
//! on the bound it heads toward is ignored entirely (no mark, no request).
//!
//! ```
//! use lightseg_core::Action;
//! use lightseg_runtime::mode::ActionMode;
//! use lightseg_runtime::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::new(0, 99), None).unwrap();
//! session.set_mode(ActionMode::On);
//! session.apply(Action::Up);
//! session.apply(Action::Up);
//! assert_eq!(session.intervals().to_string(), "0-1");
//! assert_eq!(session.cursor(), 2);
//! ```

use std::fmt;

use lightseg_core::action::Action;
use lightseg_core::interval::{IntervalSet, Point};

use crate::mode::ActionMode;
use crate::payload::UpdateRequest;
use crate::throttle::Priority;

/// Errors constructing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `min_point > max_point`.
    InvalidBounds {
        /// Configured lower bound.
        min: Point,
        /// Configured upper bound.
        max: Point,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidBounds { min, max } => {
                write!(f, "invalid bounds: min {min} is greater than max {max}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Result type for session construction.
pub type SessionResult<T> = Result<T, SessionError>;

/// Valid cursor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lowest addressable position.
    pub min_point: Point,
    /// Highest addressable position.
    pub max_point: Point,
}

impl SessionConfig {
    #[must_use]
    pub const fn new(min_point: Point, max_point: Point) -> Self {
        Self {
            min_point,
            max_point,
        }
    }

    /// Check `min_point <= max_point`.
    pub fn validate(&self) -> SessionResult<()> {
        if self.min_point > self.max_point {
            return Err(SessionError::InvalidBounds {
                min: self.min_point,
                max: self.max_point,
            });
        }
        Ok(())
    }

    /// Clamp `point` into the valid range.
    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        point.clamp(self.min_point, self.max_point)
    }

    /// Whether `point` is addressable.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (self.min_point..=self.max_point).contains(&point)
    }
}

/// Which endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Live update after an edit; may be dropped under load.
    Set,
    /// Explicit persist request; never dropped.
    Save,
}

impl RequestKind {
    /// Server path for this request.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            RequestKind::Set => "/set",
            RequestKind::Save => "/save",
        }
    }

    #[must_use]
    pub const fn priority(self) -> Priority {
        match self {
            RequestKind::Set => Priority::Low,
            RequestKind::Save => Priority::High,
        }
    }
}

/// A request produced by a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub kind: RequestKind,
    pub request: UpdateRequest,
}

impl Outbound {
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.kind.priority()
    }
}

/// One editor's view of the strip.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    cursor: Point,
    mode: ActionMode,
    lit: IntervalSet,
}

impl Session {
    /// Start a session with the cursor on `min_point` in [`ActionMode::Nav`].
    ///
    /// `seed` is a previously saved set; it has already been validated by
    /// [`IntervalSet::from_seed`]. Members outside the bounds are kept but
    /// logged, since the strip length may have changed since the save.
    pub fn new(config: SessionConfig, seed: Option<IntervalSet>) -> SessionResult<Self> {
        config.validate()?;
        let lit = seed.unwrap_or_default();
        if let (Some(first), Some(last)) = (lit.intervals().first(), lit.intervals().last())
            && (first.from < config.min_point || last.to > config.max_point)
        {
            tracing::warn!(
                min = config.min_point,
                max = config.max_point,
                seed = %lit,
                "seed has members outside the configured bounds"
            );
        }
        tracing::debug!(
            min = config.min_point,
            max = config.max_point,
            intervals = lit.len(),
            "session started"
        );
        Ok(Self {
            config,
            cursor: config.min_point,
            mode: ActionMode::Nav,
            lit,
        })
    }

    /// Apply a user action. [`Action::Quit`] is the caller's concern and
    /// yields `None`.
    pub fn apply(&mut self, action: Action) -> Option<Outbound> {
        if let Some(delta) = action.step() {
            return self.step(delta);
        }
        match action {
            Action::JumpTo(point) => self.jump_to(point),
            Action::JumpToStart => self.jump_to(self.config.min_point),
            Action::JumpToEnd => self.jump_to(self.config.max_point),
            Action::CycleMode => self.set_mode(self.mode.next()),
            Action::Save => Some(self.save()),
            Action::Quit => None,
            Action::Up | Action::Down | Action::FastUp | Action::FastDown => None,
        }
    }

    /// Move the cursor by `delta`, marking the position being left.
    pub fn step(&mut self, delta: Point) -> Option<Outbound> {
        let at_bound = match delta.signum() {
            1 => self.cursor >= self.config.max_point,
            -1 => self.cursor <= self.config.min_point,
            _ => true,
        };
        if at_bound {
            return None;
        }

        let next = self.config.clamp(self.cursor.saturating_add(delta));
        if let Some(mark) = self.mode.mark() {
            self.lit.set(self.cursor, mark);
        }
        tracing::trace!(from = self.cursor, to = next, mode = %self.mode, "cursor moved");
        self.cursor = next;
        Some(self.outbound(RequestKind::Set))
    }

    /// Put the cursor on `point` (clamped) without marking anything.
    pub fn jump_to(&mut self, point: Point) -> Option<Outbound> {
        let next = self.config.clamp(point);
        if next != point {
            tracing::debug!(requested = point, clamped = next, "jump target out of bounds");
        }
        self.cursor = next;
        Some(self.outbound(RequestKind::Set))
    }

    /// Switch modes. Emits a `set` request so consumers see the new mode.
    pub fn set_mode(&mut self, mode: ActionMode) -> Option<Outbound> {
        tracing::debug!(from = %self.mode, to = %mode, "mode changed");
        self.mode = mode;
        Some(self.outbound(RequestKind::Set))
    }

    /// Request an explicit save of the current state.
    pub fn save(&self) -> Outbound {
        tracing::info!(ranges = %self.lit, "save requested");
        self.outbound(RequestKind::Save)
    }

    /// Snapshot for the wire.
    #[must_use]
    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest::new(self.cursor, self.mode, &self.lit)
    }

    fn outbound(&self, kind: RequestKind) -> Outbound {
        Outbound {
            kind,
            request: self.update_request(),
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    #[must_use]
    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Whether the light under the cursor is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.lit.contains(self.cursor)
    }

    /// The lit positions.
    #[must_use]
    pub fn intervals(&self) -> &IntervalSet {
        &self.lit
    }

    /// One-line status: `"<cursor> <ON|OFF> [<mode>] <ranges>"`.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "{} {} [{}] {}",
            self.cursor,
            if self.is_on() { "ON" } else { "OFF" },
            self.mode,
            self.lit
        )
    }
}
