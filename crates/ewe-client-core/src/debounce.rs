//! Generation counters for debounced and sequenced callbacks
//!
//! Timers in the browser are scheduled by the caller; these types only decide
//! whether a callback that fires is still the one that should act.

use std::time::Duration;

/// Coalesces bursts of triggers into a single action
///
/// Each trigger supersedes the previous one. Only the callback carrying the
/// latest generation is allowed to fire, and only once.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: u64,
    pending: bool,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: 0,
            pending: false,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Register a new trigger, returning the generation its timer must carry
    pub fn trigger(&mut self) -> u64 {
        self.generation += 1;
        self.pending = true;
        self.generation
    }

    /// Called when a timer elapses; true if this generation should act
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.pending && generation == self.generation {
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Drop whatever is pending
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Monotonic request numbering for one poll cycle
///
/// Only the response to the most recently issued request may be applied, so
/// a slow response can never overwrite data from a newer one.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    issued: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn latest(&self) -> u64 {
        self.issued
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        sequence != 0 && sequence == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_trigger_fires_once() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        let generation = debouncer.trigger();
        assert!(debouncer.is_pending());
        assert!(debouncer.fire(generation));
        assert!(!debouncer.fire(generation));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_coalesces_to_last() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        let generations: Vec<u64> = (0..5).map(|_| debouncer.trigger()).collect();

        let fired: Vec<bool> = generations.iter().map(|g| debouncer.fire(*g)).collect();
        assert_eq!(fired, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_cancel_suppresses_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        let generation = debouncer.trigger();
        debouncer.cancel();
        assert!(!debouncer.fire(generation));
    }

    #[test]
    fn test_sequence_latest_wins() {
        let mut sequence = RequestSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert_eq!(sequence.latest(), 2);
    }

    #[test]
    fn test_sequence_nothing_issued() {
        let sequence = RequestSequence::new();
        assert!(!sequence.is_current(0));
    }
}
