//! Throttled counters for ring buffer overrun and underrun conditions.
//!
//! Under sustained overload a condition can occur tens of thousands of times
//! per second. Each counter logs one line on the first occurrence and then
//! once every `interval` occurrences after that (1, 100001, 200001, ... with
//! the default interval), carrying the running total.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Occurrences of a condition between two diagnostic lines
pub const DEFAULT_REPORT_INTERVAL: u64 = 100_000;

/// Buffer condition being counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Append while the buffer was full
    Overrun,
    /// Remove while the buffer was empty
    Underrun,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Overrun => write!(f, "overrun"),
            Condition::Underrun => write!(f, "underrun"),
        }
    }
}

/// Monotonic counter owned by a single thread
#[derive(Debug, Clone)]
pub struct ThrottledCounter {
    condition: Condition,
    count: u64,
    reports: u64,
    interval: u64,
}

impl ThrottledCounter {
    /// `interval` must be non-zero; callers validate it at construction.
    pub fn new(condition: Condition, interval: u64) -> Self {
        debug_assert!(interval > 0);
        Self {
            condition,
            count: 0,
            reports: 0,
            interval,
        }
    }

    /// Count one occurrence.
    ///
    /// Returns `Some(total)` when this occurrence was reported.
    pub fn record(&mut self, source: &str) -> Option<u64> {
        let previous = self.count;
        self.count += 1;
        if previous % self.interval == 0 {
            self.reports += 1;
            log::warn!("{}: {}: {}", source, self.condition, self.count);
            Some(self.count)
        } else {
            None
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Diagnostic lines emitted so far
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

/// Counter incremented from one thread and read from any
#[derive(Debug)]
pub struct SharedThrottledCounter {
    condition: Condition,
    count: AtomicU64,
    reports: AtomicU64,
    interval: u64,
}

impl SharedThrottledCounter {
    pub fn new(condition: Condition, interval: u64) -> Self {
        debug_assert!(interval > 0);
        Self {
            condition,
            count: AtomicU64::new(0),
            reports: AtomicU64::new(0),
            interval,
        }
    }

    /// Count `n` occurrences at once, logging one line per interval boundary
    /// crossed, each carrying the total at that boundary.
    ///
    /// Returns the number of lines emitted.
    pub fn record_many(&self, source: &str, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let previous = self.count.fetch_add(n, Ordering::Relaxed);
        let mut emitted = 0;
        for total in reported_totals(previous, n, self.interval) {
            log::warn!("{}: {}: {}", source, self.condition, total);
            emitted += 1;
        }
        if emitted > 0 {
            self.reports.fetch_add(emitted, Ordering::Relaxed);
        }
        emitted
    }

    pub fn record(&self, source: &str) -> Option<u64> {
        (self.record_many(source, 1) > 0).then(|| self.count())
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }
}

/// Totals to report when the count moves from `previous` to `previous + n`
///
/// Occurrence `b + 1` is reported for every multiple `b` of `interval` in
/// `[previous, previous + n)`.
fn reported_totals(previous: u64, n: u64, interval: u64) -> impl Iterator<Item = u64> {
    let first = previous.div_ceil(interval) * interval;
    let end = previous + n;
    (first..end).step_by(interval as usize).map(|boundary| boundary + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_reported() {
        let mut counter = ThrottledCounter::new(Condition::Overrun, 100_000);
        assert_eq!(counter.record("test"), Some(1));
        assert_eq!(counter.record("test"), None);
        assert_eq!(counter.count(), 2);
        assert_eq!(counter.reports(), 1);
    }

    #[test]
    fn test_small_interval_boundaries() {
        let mut counter = ThrottledCounter::new(Condition::Underrun, 3);
        let reported: Vec<u64> = (0..10).filter_map(|_| counter.record("test")).collect();
        assert_eq!(reported, vec![1, 4, 7, 10]);
    }

    #[test]
    fn test_shared_matches_single_threaded() {
        let mut single = ThrottledCounter::new(Condition::Overrun, 5);
        let shared = SharedThrottledCounter::new(Condition::Overrun, 5);
        for _ in 0..23 {
            assert_eq!(single.record("a"), shared.record("b"));
        }
        assert_eq!(single.reports(), shared.reports());
    }

    #[test]
    fn test_shared_record_many_counts_crossings() {
        let shared = SharedThrottledCounter::new(Condition::Overrun, 10);
        // Occurrences 1..=25 contain boundaries at pre-counts 0, 10, 20
        assert_eq!(shared.record_many("test", 25), 3);
        assert_eq!(shared.count(), 25);
        // 26..=30 contain no boundary
        assert_eq!(shared.record_many("test", 5), 0);
        // 31 is the next boundary
        assert_eq!(shared.record_many("test", 1), 1);
        assert_eq!(shared.reports(), 4);
        assert_eq!(shared.record_many("test", 0), 0);
    }

    #[test]
    fn test_block_reports_each_boundary_total() {
        let totals: Vec<u64> = reported_totals(0, 25, 10).collect();
        assert_eq!(totals, vec![1, 11, 21]);

        let totals: Vec<u64> = reported_totals(25, 5, 10).collect();
        assert!(totals.is_empty());

        let totals: Vec<u64> = reported_totals(30, 1, 10).collect();
        assert_eq!(totals, vec![31]);

        // Same totals the single-threaded counter reports one at a time
        let mut single = ThrottledCounter::new(Condition::Overrun, 7);
        let expected: Vec<u64> = (0..40).filter_map(|_| single.record("test")).collect();
        let mut totals: Vec<u64> = reported_totals(0, 17, 7).collect();
        totals.extend(reported_totals(17, 23, 7));
        assert_eq!(totals, expected);
    }

    #[test]
    fn test_condition_labels() {
        assert_eq!(Condition::Overrun.to_string(), "overrun");
        assert_eq!(Condition::Underrun.to_string(), "underrun");
    }
}
