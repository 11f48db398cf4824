//! Cancellation and deadline propagation for blocking calls.
//!
//! A [`Context`] is handed to every operation and forwarded to the
//! transport. Clones share the same cancel flag, so a context can be
//! cancelled from another thread while a call is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TransportError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    canceled: Arc<AtomicBool>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires `timeout` from now. An earlier
    /// existing deadline wins. A timeout too large to represent adds no
    /// deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The error a transport must report if the context is already done.
    pub fn err(&self) -> Option<TransportError> {
        if self.is_canceled() {
            return Some(TransportError::Canceled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Some(TransportError::DeadlineExceeded),
            _ => None,
        }
    }
}
