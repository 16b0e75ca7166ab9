#![forbid(unsafe_code)]

//! Bounded in-flight accounting for outgoing requests.
//!
//! Every edit produces a low-priority `set` request; bursts of key presses
//! would otherwise queue up stale snapshots behind a slow server. The
//! throttle drops low-priority requests while the in-flight limit is reached.
//! High-priority requests (explicit saves) are always admitted and still
//! count toward the limit while outstanding.
//!
//! A granted request holds an [`InFlight`] guard until its response arrives.
//! Dropping the guard releases the slot, so completion can happen on any
//! thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Default number of concurrently outstanding requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1;

/// Whether a request may be dropped under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Never dropped.
    High,
    /// Dropped while the in-flight limit is reached.
    Low,
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    dropped: AtomicU64,
}

/// Admission control for outgoing requests.
#[derive(Clone)]
pub struct RequestThrottle {
    max_in_flight: usize,
    counters: Arc<Counters>,
}

impl RequestThrottle {
    /// Create a throttle admitting at most `max_in_flight` low-priority
    /// requests at once. A limit of zero is raised to one.
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Try to admit a request.
    ///
    /// Returns `None` when a low-priority request is dropped.
    #[must_use = "the request slot is released when the guard is dropped"]
    pub fn try_acquire(&self, priority: Priority) -> Option<InFlight> {
        let counters = &self.counters;
        match priority {
            Priority::High => {
                counters.in_flight.fetch_add(1, Ordering::AcqRel);
            }
            Priority::Low => {
                let admitted = counters
                    .in_flight
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.max_in_flight).then_some(n + 1)
                    })
                    .is_ok();
                if !admitted {
                    let dropped = counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(
                        in_flight = self.in_flight(),
                        dropped,
                        "dropping low-priority request"
                    );
                    return None;
                }
            }
        }
        Some(InFlight {
            counters: Arc::clone(&self.counters),
        })
    }

    /// Requests currently outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Low-priority requests dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

impl fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("max_in_flight", &self.max_in_flight)
            .field("in_flight", &self.in_flight())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// An admitted request. Releases its slot on drop.
#[derive(Debug)]
pub struct InFlight {
    counters: Arc<Counters>,
}

impl InFlight {
    /// Mark the request complete. Same as dropping the guard.
    pub fn complete(self) {}
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
