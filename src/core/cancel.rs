//! Cooperative cancellation shared by parallel stages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::is_shutdown;

/// Clonable flag tripped by the first failing stage.
///
/// Workers poll it between files; it is never reset.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Cancelled explicitly or by Ctrl+C.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed) || is_shutdown()
    }
}
