//! Request sequencing for overlapping queries.
//!
//! A user can fire a second query before the first resolves. Each query takes
//! a [`Ticket`] when issued; a response is applied only if its ticket is
//! still the latest, so a slow early response cannot overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Sequence number handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(&self) -> u64 {
        self.0
    }
}

/// Monotonic ticket dispenser.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket. Tickets start at 1 and strictly increase.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no ticket has been issued after `ticket`.
    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Holds the response of the most recently issued request.
#[derive(Debug)]
pub struct LatestResponse<T> {
    sequencer: RequestSequencer,
    slot: Mutex<Option<(u64, T)>>,
}

impl<T> Default for LatestResponse<T> {
    fn default() -> Self {
        Self {
            sequencer: RequestSequencer::new(),
            slot: Mutex::new(None),
        }
    }
}

impl<T: Clone> LatestResponse<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request.
    pub fn begin(&self) -> Ticket {
        self.sequencer.issue()
    }

    /// Offer the response for `ticket`. Returns `false` and drops `value` when
    /// a newer request has been issued since.
    pub fn complete(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.sequencer.is_latest(&ticket) {
            debug!(ticket = ticket.0, "discarding stale response");
            return false;
        }
        *slot = Some((ticket.0, value));
        true
    }

    /// The applied response and its sequence number.
    pub fn current(&self) -> Option<(u64, T)> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
