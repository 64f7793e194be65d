// Event Dispatcher Port
// Some native calls only complete while the calling thread keeps pumping its own
// event queue; blocking waits interleave dispatch_pending() between polls.

/// Event dispatcher trait
pub trait EventDispatcher: Send + Sync {
    /// Process events already queued for the calling thread. Must not block.
    fn dispatch_pending(&self);
}

/// Dispatcher for threads without an event loop
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch_pending(&self) {}
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts dispatch calls
    #[derive(Default)]
    pub struct CountingDispatcher {
        calls: AtomicUsize,
    }

    impl CountingDispatcher {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EventDispatcher for CountingDispatcher {
        fn dispatch_pending(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}
