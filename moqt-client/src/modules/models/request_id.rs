use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request-id allocator. The stride of 2 leaves the other parity
/// to the peer; the initial value is configurable because some relays
/// expect client ids to start at 0 and others at 1.
#[derive(Debug)]
pub(crate) struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub(crate) fn new(initial: u64) -> Self {
        Self {
            next: AtomicU64::new(initial),
        }
    }

    pub(crate) fn next(&self) -> u64 {
        self.next.fetch_add(2, Ordering::SeqCst)
    }

    /// The id the next call to `next` would return.
    pub(crate) fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}
