//! Allocation statistics
//!
//! Process-wide counters of arena capacity.

use std::sync::atomic::{AtomicUsize, Ordering};

/// The single process-wide counter set.
///
/// Const-initialized, so it exists before the first arena and lives until
/// the process exits. Every [`super::ByteArena`] reports its capacity
/// changes here; nothing else writes to it.
static COUNTERS: Counters = Counters::new();

struct Counters {
    /// Sum of the capacities of all live arenas
    current: AtomicUsize,
    /// Highest value `current` has ever reached
    peak: AtomicUsize,
}

impl Counters {
    const fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

/// Read access to the process-wide arena statistics
///
/// The counters are intentional global state: they aggregate over every
/// arena in the process and are only meant for diagnostics.
pub struct AllocationStats;

impl AllocationStats {
    /// Bytes of arena capacity currently allocated
    pub fn current() -> usize {
        COUNTERS.current.load(Ordering::Relaxed)
    }

    /// Highest number of arena bytes ever allocated at once
    pub fn peak() -> usize {
        COUNTERS.peak.load(Ordering::Relaxed)
    }

    pub(crate) fn track_allocation(bytes: usize) {
        if bytes == 0 {
            return;
        }
        let now = COUNTERS.current.fetch_add(bytes, Ordering::Relaxed) + bytes;
        COUNTERS.peak.fetch_max(now, Ordering::Relaxed);
    }

    pub(crate) fn track_deallocation(bytes: usize) {
        if bytes > 0 {
            COUNTERS.current.fetch_sub(bytes, Ordering::Relaxed);
        }
    }

    pub(crate) fn track_change(old_capacity: usize, new_capacity: usize) {
        if new_capacity > old_capacity {
            Self::track_allocation(new_capacity - old_capacity);
        } else {
            Self::track_deallocation(old_capacity - new_capacity);
        }
    }
}
