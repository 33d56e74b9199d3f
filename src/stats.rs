//! Cache statistics: additive counters plus latency histograms.
//!
//! Grounded in `examples/original_source/caches/stats.go` (`CacheStats`) for
//! the counter set and delta semantics, generalized with a latency
//! histogram kept as `(total_nanos, count)` pairs producing mean
//! microseconds — the Go original does not track latency on the cache
//! itself (only `IoDB`'s helper `utils.TimeDuration`, see
//! `examples/original_source/utils/time.go`, which this type subsumes).

use std::time::Duration;

/// A `(total_nanos, count)` pair producing a mean in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyHistogram {
    total_nanos: u64,
    count: u64,
}

impl LatencyHistogram {
    pub fn record(&mut self, d: Duration) {
        self.total_nanos += d.as_nanos() as u64;
        self.count += 1;
    }

    pub fn mean_micros(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_nanos as f64 / self.count as f64) / 1000.0
        }
    }

    /// Mean latency of the interval between two snapshots.
    pub fn mean_micros_delta(&self, prev: &LatencyHistogram) -> f64 {
        let delta = LatencyHistogram {
            total_nanos: self.total_nanos.saturating_sub(prev.total_nanos),
            count: self.count.saturating_sub(prev.count),
        };
        delta.mean_micros()
    }
}

/// Additive cache counters. `Copy` snapshots cheaply; `dump_delta` reports
/// rates and counter diffs between two snapshots, matching
/// `CacheStats.DumpDelta` in the original.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub reads: u64,
    pub writes: u64,
    pub deletions: u64,
    pub readhits: u64,
    pub writehits: u64,
    pub deletionhits: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_hit_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.readhits as f64 / self.reads as f64
        }
    }

    pub fn write_hit_rate(&self) -> f64 {
        if self.writes == 0 {
            0.0
        } else {
            self.writehits as f64 / self.writes as f64
        }
    }

    pub fn read_hit_rate_delta(&self, prev: &CacheStats) -> f64 {
        let reads = self.reads.saturating_sub(prev.reads);
        let readhits = self.readhits.saturating_sub(prev.readhits);
        if reads == 0 {
            0.0
        } else {
            readhits as f64 / reads as f64
        }
    }

    pub fn write_hit_rate_delta(&self, prev: &CacheStats) -> f64 {
        let writes = self.writes.saturating_sub(prev.writes);
        let writehits = self.writehits.saturating_sub(prev.writehits);
        if writes == 0 {
            0.0
        } else {
            writehits as f64 / writes as f64
        }
    }

    /// Matches `CacheStats.DumpDelta`'s CSV row shape: iteration number is
    /// prepended by the caller, this formats everything after it.
    pub fn dump_delta_row(&self, prev: &CacheStats) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.read_hit_rate_delta(prev),
            self.write_hit_rate_delta(prev),
            self.readhits.saturating_sub(prev.readhits),
            self.writehits.saturating_sub(prev.writehits),
            self.deletionhits.saturating_sub(prev.deletionhits),
            self.reads.saturating_sub(prev.reads),
            self.writes.saturating_sub(prev.writes),
            self.deletions.saturating_sub(prev.deletions),
            self.insertions.saturating_sub(prev.insertions),
            self.evictions.saturating_sub(prev.evictions),
            self.invalidations.saturating_sub(prev.invalidations),
        )
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Read Hit Rate: {}\nWrite Hit Rate: {}\nRead hits: {}\nWrite hits: {}\n\
             Delete hits: {}\nReads: {}\nWrites: {}\nDeletions: {}\nInsertions: {}\n\
             Evictions: {}\nInvalidations: {}\n",
            self.read_hit_rate(),
            self.write_hit_rate(),
            self.readhits,
            self.writehits,
            self.deletionhits,
            self.reads,
            self.writes,
            self.deletions,
            self.insertions,
            self.evictions,
            self.invalidations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_with_no_traffic() {
        let s = CacheStats::new();
        assert_eq!(s.read_hit_rate(), 0.0);
        assert_eq!(s.write_hit_rate(), 0.0);
    }

    #[test]
    fn delta_isolates_the_interval() {
        let mut prev = CacheStats::new();
        prev.reads = 10;
        prev.readhits = 5;

        let mut now = prev;
        now.reads += 4;
        now.readhits += 4;

        assert_eq!(now.read_hit_rate_delta(&prev), 1.0);
        assert_eq!(now.read_hit_rate(), 9.0 / 14.0);
    }

    #[test]
    fn latency_histogram_means_in_microseconds() {
        let mut h = LatencyHistogram::default();
        h.record(Duration::from_micros(10));
        h.record(Duration::from_micros(30));
        assert!((h.mean_micros() - 20.0).abs() < 1e-6);
    }
}
