use std::sync::atomic::{AtomicU64, Ordering};

/// Generation stamp handed to an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks whether a view still wants the result of a load it started.
///
/// The tracker never aborts a request; it only answers "is this result still
/// wanted" when the result arrives. Tearing the view down, or starting a load
/// that supersedes the current one, moves the generation on and every ticket
/// issued before that point goes stale.
#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: AtomicU64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a load that supersedes any load already in flight.
    pub fn begin(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket { generation }
    }

    /// Joins the current generation without superseding other loads, for
    /// views where concurrent loads are independent.
    pub fn join(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Tears the view down: every outstanding ticket goes stale.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_load_supersedes_old() {
        let tracker = LoadTracker::new();
        let first = tracker.begin();
        assert!(tracker.is_current(first));

        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_cancel_discards_everything_outstanding() {
        let tracker = LoadTracker::new();
        let begun = tracker.begin();
        let joined = tracker.join();
        assert_eq!(begun, joined);

        tracker.cancel();
        assert!(!tracker.is_current(begun));
        assert!(!tracker.is_current(joined));
        assert!(tracker.is_current(tracker.join()));
    }

    #[test]
    fn test_joined_loads_do_not_supersede_each_other() {
        let tracker = LoadTracker::new();
        let a = tracker.join();
        let b = tracker.join();
        assert!(tracker.is_current(a));
        assert!(tracker.is_current(b));
    }
}
