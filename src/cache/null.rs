//! `NullCache` — counts traffic but caches nothing.
//!
//! Grounded in `examples/original_source/caches/nullcache.go`: every
//! operation only touches [`CacheStats`]. Used as the page cache when
//! `pagecachesize` is 0, so the workload driver's code path stays
//! unconditional instead of branching on whether a page cache exists.

use crate::cache::Cache;
use crate::stats::CacheStats;

#[derive(Debug, Default)]
pub struct NullCache {
    stats: CacheStats,
}

impl NullCache {
    pub fn new() -> Self {
        NullCache::default()
    }
}

impl Cache for NullCache {
    fn write(&mut self, _obj: &str, _chunk: &str) {
        self.stats.writes += 1;
    }

    fn read(&mut self, _obj: &str, _chunk: &str) -> bool {
        self.stats.reads += 1;
        false
    }

    fn delete(&mut self, _obj: &str) {
        self.stats.deletions += 1;
    }

    fn invalidate(&mut self, _key: &str) {}

    fn stats(&self) -> CacheStats {
        self.stats
    }

    fn stats_clear(&mut self) {
        self.stats = CacheStats::new();
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_read_is_a_miss() {
        let mut c = NullCache::new();
        assert!(!c.read("a", "0"));
        assert_eq!(c.stats().reads, 1);
        assert_eq!(c.stats().readhits, 0);
    }
}
