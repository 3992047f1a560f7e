//! Job interruption shared between the runner and whoever stops it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable interruption flag. Once triggered, the runner finishes no
/// further interrogations and starts no further images.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the batch stop. Returns whether a stop had already been
    /// requested.
    pub fn trigger(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    /// Whether a stop was requested.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        assert!(!interrupt.is_triggered());
        assert!(!handle.trigger());
        assert!(interrupt.is_triggered());
    }

    #[test]
    fn test_trigger_reports_repeat_requests() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.trigger());
        assert!(interrupt.clone().trigger());
        assert!(interrupt.trigger());
    }
}
