//! Search statistics collection.
//!
//! Counters are atomics so evaluation workers can record into a shared
//! collector; phase records sit behind a mutex.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Timing and volume of one search phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStatistics {
    /// Phase name: `seed`, `enumerate`, `evaluate` or `select`.
    pub phase: String,
    pub duration: Duration,
    /// Items the phase produced or consumed, phase-specific.
    pub items: u64,
}

impl PhaseStatistics {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            duration: Duration::ZERO,
            items: 0,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Complete statistics for one planning request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStatistics {
    /// Duration sequences sent to the speed search, baselines included.
    pub sequences_examined: u64,
    /// Sequences cut off by the speed bound during enumeration.
    pub sequences_pruned: u64,
    /// Sequences removed by the rider-strength heuristics.
    pub sequences_filtered: u64,
    /// Sequences whose speed search failed to converge or found nothing.
    pub evaluation_failures: u64,
    /// Rotations evaluated across all speed searches.
    pub compute_iterations: u64,
    /// True when enumeration stopped at the node limit.
    pub node_limit_reached: bool,
    pub elapsed: Duration,
    pub phases: Vec<PhaseStatistics>,
}

impl SearchStatistics {
    pub fn phase(&self, name: &str) -> Option<&PhaseStatistics> {
        self.phases.iter().find(|p| p.phase == name)
    }

    /// Sequences examined per second of elapsed time.
    pub fn sequences_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sequences_examined as f64 / secs
        } else {
            0.0
        }
    }

    /// Folds a nested search (last five, last four) into this one.
    pub fn absorb(&mut self, other: &SearchStatistics) {
        self.sequences_examined += other.sequences_examined;
        self.sequences_pruned += other.sequences_pruned;
        self.sequences_filtered += other.sequences_filtered;
        self.evaluation_failures += other.evaluation_failures;
        self.compute_iterations += other.compute_iterations;
        self.node_limit_reached |= other.node_limit_reached;
    }
}

/// Thread-safe collector for search statistics.
///
/// Create one per request, record while searching, then call
/// [`into_statistics`](Self::into_statistics).
#[derive(Debug)]
pub struct StatisticsCollector {
    start_time: Instant,
    sequences_examined: AtomicU64,
    sequences_pruned: AtomicU64,
    sequences_filtered: AtomicU64,
    evaluation_failures: AtomicU64,
    compute_iterations: AtomicU64,
    node_limit_reached: AtomicBool,
    phases: Mutex<Vec<PhaseStatistics>>,
}

impl StatisticsCollector {
    /// Creates a collector. The start time is recorded now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            sequences_examined: AtomicU64::new(0),
            sequences_pruned: AtomicU64::new(0),
            sequences_filtered: AtomicU64::new(0),
            evaluation_failures: AtomicU64::new(0),
            compute_iterations: AtomicU64::new(0),
            node_limit_reached: AtomicBool::new(false),
            phases: Mutex::new(Vec::new()),
        }
    }

    pub fn record_examined(&self, count: u64) {
        self.sequences_examined.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_pruned(&self, count: u64) {
        self.sequences_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_filtered(&self, count: u64) {
        self.sequences_filtered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failures(&self, count: u64) {
        self.evaluation_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_iterations(&self, count: u64) {
        self.compute_iterations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_node_limit_reached(&self) {
        self.node_limit_reached.store(true, Ordering::Relaxed);
    }

    /// Records a finished phase and returns its index.
    pub fn record_phase(&self, phase: &str, duration: Duration, items: u64) -> usize {
        let mut record = PhaseStatistics::new(phase);
        record.duration = duration;
        record.items = items;
        match self.phases.lock() {
            Ok(mut phases) => {
                phases.push(record);
                phases.len() - 1
            }
            Err(_) => 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn current_examined(&self) -> u64 {
        self.sequences_examined.load(Ordering::Relaxed)
    }

    pub fn current_iterations(&self) -> u64 {
        self.compute_iterations.load(Ordering::Relaxed)
    }

    /// Statistics so far without consuming the collector.
    pub fn snapshot(&self) -> SearchStatistics {
        let phases = self
            .phases
            .lock()
            .map(|phases| phases.clone())
            .unwrap_or_default();
        self.build(phases)
    }

    /// Consumes the collector.
    pub fn into_statistics(self) -> SearchStatistics {
        let phases = match self.phases.lock() {
            Ok(mut phases) => std::mem::take(&mut *phases),
            Err(_) => Vec::new(),
        };
        self.build(phases)
    }

    fn build(&self, phases: Vec<PhaseStatistics>) -> SearchStatistics {
        SearchStatistics {
            sequences_examined: self.sequences_examined.load(Ordering::Relaxed),
            sequences_pruned: self.sequences_pruned.load(Ordering::Relaxed),
            sequences_filtered: self.sequences_filtered.load(Ordering::Relaxed),
            evaluation_failures: self.evaluation_failures.load(Ordering::Relaxed),
            compute_iterations: self.compute_iterations.load(Ordering::Relaxed),
            node_limit_reached: self.node_limit_reached.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
            phases,
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_statistics_new() {
        let stats = PhaseStatistics::new("seed");
        assert_eq!(stats.phase, "seed");
        assert_eq!(stats.items, 0);
        assert_eq!(stats.duration_ms(), 0);
    }

    #[test]
    fn test_collector_counters() {
        let collector = StatisticsCollector::new();
        collector.record_examined(3);
        collector.record_examined(2);
        collector.record_pruned(10);
        collector.record_iterations(40);
        collector.record_failures(1);

        assert_eq!(collector.current_examined(), 5);
        assert_eq!(collector.current_iterations(), 40);

        let stats = collector.into_statistics();
        assert_eq!(stats.sequences_pruned, 10);
        assert_eq!(stats.evaluation_failures, 1);
        assert!(!stats.node_limit_reached);
    }

    #[test]
    fn test_collector_phases() {
        let collector = StatisticsCollector::new();
        let seed = collector.record_phase("seed", Duration::from_millis(3), 1);
        let enumerate = collector.record_phase("enumerate", Duration::from_millis(20), 81);
        assert_eq!(seed, 0);
        assert_eq!(enumerate, 1);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.phases.len(), 2);

        collector.record_node_limit_reached();
        let stats = collector.into_statistics();
        assert!(stats.node_limit_reached);
        assert_eq!(stats.phase("enumerate").map(|p| p.items), Some(81));
        assert_eq!(stats.phase("enumerate").map(|p| p.duration_ms()), Some(20));
        assert!(stats.phase("select").is_none());
    }

    #[test]
    fn test_collector_thread_safety() {
        let collector = StatisticsCollector::new();

        rayon::scope(|s| {
            for _ in 0..4 {
                s.spawn(|_| {
                    for _ in 0..1000 {
                        collector.record_examined(1);
                        collector.record_iterations(2);
                    }
                });
            }
        });

        assert_eq!(collector.current_examined(), 4000);
        assert_eq!(collector.current_iterations(), 8000);
    }

    #[test]
    fn test_absorb() {
        let mut outer = SearchStatistics {
            sequences_examined: 10,
            compute_iterations: 100,
            ..SearchStatistics::default()
        };
        let inner = SearchStatistics {
            sequences_examined: 4,
            compute_iterations: 30,
            node_limit_reached: true,
            ..SearchStatistics::default()
        };
        outer.absorb(&inner);
        assert_eq!(outer.sequences_examined, 14);
        assert_eq!(outer.compute_iterations, 130);
        assert!(outer.node_limit_reached);
        assert_eq!(outer.sequences_per_second(), 0.0);
    }
}
