//! Dispatch counters
//!
//! Cheap atomic counters incremented on the hot paths; `snapshot()` produces
//! a plain struct for display or periodic logging.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide dispatch counters
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub(crate) consult_requests: AtomicU64,
    pub(crate) consult_matches: AtomicU64,
    pub(crate) consult_misses: AtomicU64,
    pub(crate) calls_accepted: AtomicU64,
    pub(crate) calls_rejected: AtomicU64,
    pub(crate) calls_ended: AtomicU64,
    pub(crate) signals_relayed: AtomicU64,
    pub(crate) signals_dropped: AtomicU64,
    pub(crate) location_updates: AtomicU64,
    pub(crate) emergencies_reported: AtomicU64,
}

impl DispatchStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            consult_requests: self.consult_requests.load(Ordering::Relaxed),
            consult_matches: self.consult_matches.load(Ordering::Relaxed),
            consult_misses: self.consult_misses.load(Ordering::Relaxed),
            calls_accepted: self.calls_accepted.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
            calls_ended: self.calls_ended.load(Ordering::Relaxed),
            signals_relayed: self.signals_relayed.load(Ordering::Relaxed),
            signals_dropped: self.signals_dropped.load(Ordering::Relaxed),
            location_updates: self.location_updates.load(Ordering::Relaxed),
            emergencies_reported: self.emergencies_reported.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub consult_requests: u64,
    pub consult_matches: u64,
    pub consult_misses: u64,
    pub calls_accepted: u64,
    pub calls_rejected: u64,
    pub calls_ended: u64,
    pub signals_relayed: u64,
    pub signals_dropped: u64,
    pub location_updates: u64,
    pub emergencies_reported: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let snapshot = DispatchStats::new().snapshot();
        assert_eq!(snapshot, StatsSnapshot::default());
    }

    #[test]
    fn test_inc_shows_in_snapshot() {
        let stats = DispatchStats::new();

        DispatchStats::inc(&stats.signals_relayed);
        DispatchStats::inc(&stats.signals_relayed);
        DispatchStats::inc(&stats.signals_dropped);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.signals_relayed, 2);
        assert_eq!(snapshot.signals_dropped, 1);
        assert_eq!(snapshot.consult_requests, 0);
    }
}
