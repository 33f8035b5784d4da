//! Cooperative cancellation.
//!
//! Validation and graph passes query a [`CancelChecker`] once per top-level
//! loop iteration. A cancelled pass stops early and reports [`Cancelled`]
//! instead of a result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Signal returned by a pass that observed cancellation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Something that can be asked whether the current pass should stop.
pub trait CancelChecker: Send + Sync {
    /// Returns `true` once the caller has requested cancellation.
    fn is_cancelled(&self) -> bool;

    /// Returns `Err(Cancelled)` once cancellation was requested.
    fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Checker that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancelChecker for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared cancellation flag.
///
/// Clones share the same flag, so one clone can be handed to a worker while
/// another stays with the requester.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl CancelChecker for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
