#![forbid(unsafe_code)]

//! Lightseg Runtime
//!
//! The controller side of a light-segment editor. A [`Session`] owns the
//! cursor, the current [`ActionMode`], and the lit [`IntervalSet`]; every
//! change produces an [`Outbound`] request carrying an [`UpdateRequest`].
//!
//! # Key Components
//!
//! - [`Session`] - Cursor, mode, and lit set; turns actions into requests
//! - [`Dispatcher`] - Throttled delivery of requests to a [`RequestSink`]
//! - [`RequestThrottle`] - Drops stale low-priority requests under load
//! - [`Saver`] / [`read_seed`] - Persisted state and seed loading
//! - [`PixelController`] / [`PixelDriver`] - RGB frames for the strip
//!
//! # How it fits together
//! Key events are mapped to [`lightseg_core::Action`]s, applied to the
//! session, and the resulting requests go through the dispatcher. The local
//! sink feeds `set` requests to the pixel driver and `save` requests to the
//! configured saver. A saved file ends with a seed line that
//! [`read_seed`] loads on the next start.
//!
//! [`IntervalSet`]: lightseg_core::IntervalSet

pub mod dispatch;
pub mod mode;
pub mod payload;
pub mod persistence;
pub mod pixels;
pub mod session;
pub mod throttle;

pub use dispatch::{
    DispatchError, DispatchOutcome, DispatchResult, Dispatcher, LocalSink, RequestSink,
};
pub use mode::ActionMode;
pub use payload::{PayloadError, UpdateMetadata, UpdateRequest};
pub use persistence::{
    FileSaver, LogSaver, MemorySaver, PersistError, PersistResult, Saver, parse_seed_line,
    read_seed,
};
pub use pixels::{
    Blinker, Chaser, DEFAULT_PERIOD, FrameSink, MAX_LIGHTS, MemorySink, Palette,
    PixelController, PixelDriver, PixelError, fill_states, render_frame,
};
pub use session::{
    Outbound, RequestKind, Session, SessionConfig, SessionError, SessionResult,
};
pub use throttle::{DEFAULT_MAX_IN_FLIGHT, InFlight, Priority, RequestThrottle};
