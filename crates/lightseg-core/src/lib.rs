#![forbid(unsafe_code)]

//! Core: interval sets, keyboard input, and key actions.

pub mod action;
pub mod input;
pub mod interval;
pub mod logging;

pub use action::{Action, FAST_STEP};
pub use input::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use interval::{Interval, IntervalSet, Mark, Point, SeedError};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
