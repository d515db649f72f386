//! Per-call deadline and cancellation carrier.
//!
//! # Responsibility
//! - Let callers bound every data-access operation in time or cancel it.
//! - Provide the check used by store handles before, during and after a
//!   SQLite call.
//!
//! # Invariants
//! - A cancelled token stays cancelled.
//! - `OpContext::background()` never interrupts.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why an operation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    Cancelled,
    DeadlineExceeded,
}

impl Display for InterruptReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled by caller"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Deadline/cancellation options accompanying one operation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl OpContext {
    /// Context with no deadline and no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this context should stop, if any.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn interrupt_reason(&self) -> Option<InterruptReason> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(InterruptReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(InterruptReason::DeadlineExceeded)
            }
            _ => None,
        }
    }

    /// Whether the context can ever interrupt a call.
    pub(crate) fn is_bounded(&self) -> bool {
        self.deadline.is_some() || self.cancel.is_some()
    }
}
