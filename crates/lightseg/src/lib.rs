#![forbid(unsafe_code)]

//! Lightseg public facade crate.
//!
//! Re-exports the interval set, input, and session types from the internal
//! crates and offers a prelude for applications that drive a light strip.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use lightseg_core::action::{Action, FAST_STEP};
pub use lightseg_core::input::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use lightseg_core::interval::{Interval, IntervalSet, Mark, Point, SeedError};

// --- Runtime re-exports ----------------------------------------------------

pub use lightseg_runtime::{
    ActionMode, DispatchError, DispatchOutcome, Dispatcher, FileSaver, FrameSink, LocalSink,
    LogSaver, MemorySaver, MemorySink, Outbound, Palette, PayloadError, PersistError,
    PixelController, PixelDriver, PixelError, RequestKind, RequestSink, RequestThrottle, Saver,
    Session, SessionConfig, SessionError, UpdateRequest, read_seed,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for lightseg apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Invalid options, with message.
    Config(String),
    /// Invalid session configuration.
    Session(SessionError),
    /// Loading a seed or saving state failed.
    Persist(PersistError),
    /// A payload could not be decoded.
    Payload(PayloadError),
    /// A request could not be delivered.
    Dispatch(DispatchError),
    /// The pixel controller could not be built.
    Pixel(PixelError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(msg) => write!(f, "{msg}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "{err}"),
            Self::Dispatch(err) => write!(f, "{err}"),
            Self::Pixel(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Config(_) => None,
            Self::Session(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Dispatch(err) => Some(err),
            Self::Pixel(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<PersistError> for Error {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        Self::Payload(err)
    }
}

impl From<DispatchError> for Error {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

impl From<PixelError> for Error {
    fn from(err: PixelError) -> Self {
        Self::Pixel(err)
    }
}

/// Standard result type for lightseg APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Action, ActionMode, Error, Interval, IntervalSet, KeyCode, KeyEvent, Mark, Modifiers,
        Point, Result, Saver, Session, SessionConfig,
    };

    pub use crate::{core, runtime};
}

pub use lightseg_core as core;
pub use lightseg_runtime as runtime;
