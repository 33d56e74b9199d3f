//! Two-phase simulator loop and its state machine.
//!
//! Grounded in `examples/original_source/foocsim/foocsim.go`'s `simulate()`
//! and `main()`: warmup and measurement share the same `simulate` shape
//! (drive `numios` I/Os, round-robin one `Gen()` per application, sample
//! stats every `dataperiod`), and `main()` sequences warmup →
//! `cache.StatsClear()` → measurement → `cache.Close()`. This module makes
//! that sequencing an explicit `Created → Warming → Cleared → Measuring →
//! Closed` state machine instead of straight-line code — `stats_clear` is
//! only legal from `Warming`, `close` only from `Measuring` or `Cleared`.

use crate::cache::Cache;
use crate::config::Config;
use crate::metrics::MetricsSink;
use crate::workload::Application;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Created,
    Warming,
    Cleared,
    Measuring,
    Closed,
}

pub struct Simulator {
    state: SimState,
    config: Config,
    cache: Box<dyn Cache>,
    apps: Vec<Application>,
}

impl Simulator {
    pub fn new(config: Config, cache: Box<dyn Cache>, apps: Vec<Application>) -> Self {
        assert!(!apps.is_empty(), "simulator needs at least one application");
        Simulator {
            state: SimState::Created,
            config,
            cache,
            apps,
        }
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Drives the configured number of I/Os without reporting unless
    /// `warmupstats` is set, then leaves the simulator in `Warming` awaiting
    /// `stats_clear`.
    pub fn warmup(&mut self, sink: &mut dyn MetricsSink) -> std::io::Result<()> {
        assert_eq!(self.state, SimState::Created, "warmup is only legal from Created");
        self.state = SimState::Warming;
        log::info!("warmup: starting ({} I/Os)", self.config.ios);
        self.run_phase(sink)?;
        if self.config.warmupstats {
            self.log_stats("warmup");
        }
        log::info!("warmup: complete");
        Ok(())
    }

    /// Transitions straight to `Warming` without driving any I/O, for runs
    /// with `warmup=false`. The state machine still requires a `Warming`
    /// stop on the way to `stats_clear`; this just skips the phase's work,
    /// matching the original's unconditional `StatsClear()` call regardless
    /// of whether the warmup block ran.
    pub fn skip_warmup(&mut self) {
        assert_eq!(self.state, SimState::Created, "skip_warmup is only legal from Created");
        self.state = SimState::Warming;
    }

    /// Resets the cache's counters between warmup and measurement, and
    /// rewinds every application's request generator back to its initial
    /// seed so the measured phase draws the same request sequence the
    /// warmup phase did. Only legal while `Warming`.
    pub fn stats_clear(&mut self) {
        assert_eq!(self.state, SimState::Warming, "stats_clear is only legal from Warming");
        self.cache.stats_clear();
        for app in &mut self.apps {
            app.reset();
        }
        self.state = SimState::Cleared;
    }

    /// Drives the measured phase, sampling `(iteration, stats_delta)` into
    /// `sink` every `dataperiod` I/Os. Only legal while `Cleared`.
    pub fn measure(&mut self, sink: &mut dyn MetricsSink) -> std::io::Result<()> {
        assert_eq!(self.state, SimState::Cleared, "measure is only legal from Cleared");
        self.state = SimState::Measuring;
        log::info!("measurement: starting ({} I/Os)", self.config.ios);
        self.run_phase(sink)?;
        self.log_stats("measurement");
        log::info!("measurement: complete");
        Ok(())
    }

    /// Releases every application's page cache and the main cache. Only
    /// legal from `Measuring` or `Cleared` (a run with no measured I/Os is
    /// still closeable).
    pub fn close(&mut self) {
        assert!(
            matches!(self.state, SimState::Measuring | SimState::Cleared),
            "close is only legal from Measuring or Cleared"
        );
        for app in &mut self.apps {
            app.close();
        }
        self.cache.close();
        self.state = SimState::Closed;
        log::info!("simulator: closed");
    }

    fn run_phase(&mut self, sink: &mut dyn MetricsSink) -> std::io::Result<()> {
        let mut prev = self.cache.stats();
        for io in 0..self.config.ios {
            if io % self.config.dataperiod == 0 {
                let now = self.cache.stats();
                sink.record(io, &now, &prev)?;
                prev = now;
            }
            for app in &mut self.apps {
                app.gen(self.cache.as_mut());
            }
        }
        sink.flush()
    }

    fn log_stats(&self, phase: &str) {
        let stats = self.cache.stats();
        log::info!(
            "{phase}: read_hit_rate={:.4} write_hit_rate={:.4} reads={} writes={} evictions={}",
            stats.read_hit_rate(),
            stats.write_hit_rate(),
            stats.reads,
            stats.writes,
            stats.evictions,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::null::NullCache;
    use crate::cache::simple::SimpleCache;
    use crate::config::{CacheType, Cli};
    use crate::metrics::NullMetricsSink;
    use crate::workload::{BlockGenerator, File, UniformGenerator};
    use std::sync::{Arc, Mutex};

    fn test_config(ios: u64, dataperiod: u64) -> Config {
        Config::derive(Cli {
            blocksize: 4,
            maxfilesize: 1,
            randomfilesize: false,
            cachesize: 1,
            bcpercent: 0.1,
            numfiles: 1,
            ios,
            reads: 65,
            deletions: 0,
            writethrough: true,
            dataperiod,
            cachetype: CacheType::Simple,
            pagecachesize: 0,
            clients: 1,
            warmup: true,
            warmupstats: false,
            seed: 1,
        })
        .unwrap()
    }

    fn one_app(seed: u64) -> Application {
        let file = File::new(8, Box::new(UniformGenerator::new(8, 65, seed)));
        Application::new(vec![file], 0, Box::new(NullCache::new()), seed)
    }

    #[test]
    fn state_machine_transitions_in_order() {
        let cfg = test_config(20, 5);
        let cache: Box<dyn Cache> = Box::new(SimpleCache::new(4, true));
        let mut sim = Simulator::new(cfg, cache, vec![one_app(1)]);

        assert_eq!(sim.state(), SimState::Created);
        sim.warmup(&mut NullMetricsSink).unwrap();
        assert_eq!(sim.state(), SimState::Warming);
        sim.stats_clear();
        assert_eq!(sim.state(), SimState::Cleared);
        sim.measure(&mut NullMetricsSink).unwrap();
        assert_eq!(sim.state(), SimState::Measuring);
        sim.close();
        assert_eq!(sim.state(), SimState::Closed);
    }

    #[test]
    #[should_panic(expected = "stats_clear is only legal from Warming")]
    fn stats_clear_before_warmup_panics() {
        let cfg = test_config(10, 5);
        let cache: Box<dyn Cache> = Box::new(SimpleCache::new(4, true));
        let mut sim = Simulator::new(cfg, cache, vec![one_app(1)]);
        sim.stats_clear();
    }

    #[test]
    #[should_panic(expected = "close is only legal from Measuring or Cleared")]
    fn close_before_any_phase_panics() {
        let cfg = test_config(10, 5);
        let cache: Box<dyn Cache> = Box::new(SimpleCache::new(4, true));
        let mut sim = Simulator::new(cfg, cache, vec![one_app(1)]);
        sim.close();
    }

    #[test]
    fn measurement_phase_resets_counters_from_warmup() {
        let cfg = test_config(30, 100);
        let cache: Box<dyn Cache> = Box::new(SimpleCache::new(4, true));
        let mut sim = Simulator::new(cfg, cache, vec![one_app(2)]);

        sim.warmup(&mut NullMetricsSink).unwrap();
        sim.stats_clear();
        sim.measure(&mut NullMetricsSink).unwrap();
        sim.close();
    }

    /// Wraps [`UniformGenerator`] and records every draw, so a test can
    /// confirm the measured phase replays warmup's request sequence.
    struct RecordingGenerator {
        inner: UniformGenerator,
        log: Arc<Mutex<Vec<(u64, bool)>>>,
    }

    impl BlockGenerator for RecordingGenerator {
        fn gen(&mut self) -> (u64, bool) {
            let v = self.inner.gen();
            self.log.lock().unwrap().push(v);
            v
        }

        fn reset(&mut self) {
            self.inner.reset();
        }
    }

    #[test]
    fn measure_replays_warmups_request_sequence() {
        let cfg = test_config(10, 100);
        let cache: Box<dyn Cache> = Box::new(SimpleCache::new(4, true));

        let log = Arc::new(Mutex::new(Vec::new()));
        let file = File::new(
            8,
            Box::new(RecordingGenerator {
                inner: UniformGenerator::new(8, 65, 9),
                log: log.clone(),
            }),
        );
        let app = Application::new(vec![file], 0, Box::new(NullCache::new()), 9);
        let mut sim = Simulator::new(cfg, cache, vec![app]);

        sim.warmup(&mut NullMetricsSink).unwrap();
        sim.stats_clear();
        sim.measure(&mut NullMetricsSink).unwrap();
        sim.close();

        let draws = log.lock().unwrap();
        let (warmup_draws, measure_draws) = draws.split_at(10);
        assert_eq!(warmup_draws, measure_draws);
    }
}
