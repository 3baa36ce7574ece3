//! Cancellation module - cooperative stop flag shared by audit tasks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Write-once cancellation flag
///
/// One token is created per run and cloned into every task. It is set at
/// most once (fatal quota exhaustion or an operator interrupt) and never
/// reset. Tasks check it before dispatch and at every chunk boundary;
/// in-flight provider calls are not preempted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the "running" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag
    ///
    /// Returns `true` only for the call that actually flipped it.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Whether the flag has been set
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_write_once() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_visible_across_threads() {
        let token = CancellationToken::new();
        let worker = {
            let token = token.clone();
            std::thread::spawn(move || token.cancel())
        };
        assert!(worker.join().unwrap());
        assert!(token.is_cancelled());
    }
}
