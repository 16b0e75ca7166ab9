#![forbid(unsafe_code)]

//! Routing of session output to its consumers.
//!
//! The [`Dispatcher`] admits each [`Outbound`] through a [`RequestThrottle`]
//! and hands it to a [`RequestSink`]. The sink owns the [`InFlight`] slot and
//! releases it when delivery finishes; a sink that answers asynchronously may
//! move the slot to another thread.
//!
//! [`LocalSink`] is the in-process consumer: `set` requests go to a
//! [`PixelDriver`], `save` requests go to a [`Saver`].

use std::fmt;

use crate::persistence::{PersistError, Saver};
use crate::pixels::PixelDriver;
use crate::session::{Outbound, RequestKind};
use crate::throttle::{InFlight, RequestThrottle};

/// Delivery failures.
#[derive(Debug)]
pub enum DispatchError {
    /// The pixel driver has stopped.
    Disconnected,
    /// Saving failed.
    Persist(PersistError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Disconnected => write!(f, "pixel driver is not running"),
            DispatchError::Persist(e) => write!(f, "save failed: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Disconnected => None,
            DispatchError::Persist(e) => Some(e),
        }
    }
}

impl From<PersistError> for DispatchError {
    fn from(e: PersistError) -> Self {
        DispatchError::Persist(e)
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// What happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the sink.
    Sent,
    /// Dropped by the throttle.
    Dropped,
}

/// Consumer of admitted requests.
pub trait RequestSink: Send {
    /// Deliver `outbound`. Dropping `slot` marks the request complete.
    fn deliver(&mut self, outbound: Outbound, slot: InFlight) -> DispatchResult<()>;
}

/// Throttled front end for a [`RequestSink`].
pub struct Dispatcher {
    throttle: RequestThrottle,
    sink: Box<dyn RequestSink>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(throttle: RequestThrottle, sink: Box<dyn RequestSink>) -> Self {
        Self { throttle, sink }
    }

    /// Admit and deliver one request.
    pub fn dispatch(&mut self, outbound: Outbound) -> DispatchResult<DispatchOutcome> {
        let priority = outbound.priority();
        let Some(slot) = self.throttle.try_acquire(priority) else {
            return Ok(DispatchOutcome::Dropped);
        };
        tracing::trace!(
            path = outbound.kind.path(),
            cursor = outbound.request.cursor(),
            "dispatching request"
        );
        self.sink.deliver(outbound, slot)?;
        Ok(DispatchOutcome::Sent)
    }

    #[must_use]
    pub fn throttle(&self) -> &RequestThrottle {
        &self.throttle
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

/// In-process consumer: pixels and saves.
pub struct LocalSink {
    pixels: Option<PixelDriver>,
    saver: Box<dyn Saver>,
}

impl LocalSink {
    /// Create a sink. Without a driver, `set` requests are accepted and
    /// discarded.
    #[must_use]
    pub fn new(pixels: Option<PixelDriver>, saver: Box<dyn Saver>) -> Self {
        Self { pixels, saver }
    }

    /// Stop the pixel driver, if any, and wait for it.
    pub fn shutdown(&mut self) {
        if let Some(driver) = self.pixels.take() {
            driver.stop();
        }
    }
}

impl RequestSink for LocalSink {
    fn deliver(&mut self, outbound: Outbound, slot: InFlight) -> DispatchResult<()> {
        let Outbound { kind, request } = outbound;
        let result = match kind {
            RequestKind::Set => match &self.pixels {
                Some(driver) if !driver.send(request) => Err(DispatchError::Disconnected),
                _ => Ok(()),
            },
            RequestKind::Save => self.saver.save(&request.on_ranges).map_err(|e| {
                tracing::error!(saver = self.saver.name(), error = %e, "failed to save");
                DispatchError::from(e)
            }),
        };
        slot.complete();
        result
    }
}

impl fmt::Debug for LocalSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSink")
            .field("pixels", &self.pixels.is_some())
            .field("saver", &self.saver.name())
            .finish()
    }
}
