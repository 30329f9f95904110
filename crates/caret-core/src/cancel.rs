//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A token for cooperative cancellation of a highlight job.
///
/// Clones share one flag. Tokenizers poll [`CancellationToken::is_cancelled`] between tokens
/// and bail out with [`crate::HighlightError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// `Err(Cancelled)` once cancellation has been requested, for use with `?`.
    #[inline]
    pub fn check(&self) -> Result<(), crate::HighlightError> {
        if self.is_cancelled() {
            Err(crate::HighlightError::Cancelled)
        } else {
            Ok(())
        }
    }
}
