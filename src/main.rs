//! CLI entry point — wires configuration, cache construction, the workload
//! driver, and the simulator loop together.
//!
//! Grounded in `examples/original_source/foocsim/foocsim.go`'s `main()`:
//! parse flags, build the cache for the configured `cachetype`, run an
//! optional warmup phase, clear stats, run the measured phase, close.
//! CPU profiling is not carried over.

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cachesim::cache::iocache::IoCache;
use cachesim::cache::null::NullCache;
use cachesim::cache::{build_cache, Cache};
use cachesim::config::{Cli, Config};
use cachesim::metrics::FileMetricsSink;
use cachesim::simulator::Simulator;
use cachesim::workload::{Application, File, UniformGenerator};

fn build_page_cache(config: &Config) -> Box<dyn Cache> {
    if config.pagecacheblocks == 0 {
        Box::new(NullCache::new())
    } else {
        Box::new(IoCache::new(config.pagecacheblocks as usize, config.writethrough))
    }
}

fn build_applications(config: &Config, seed: u64) -> Vec<Application> {
    (0..config.clients)
        .map(|client| {
            let app_seed = seed.wrapping_add(client);
            let files = (0..config.numfiles)
                .map(|file_idx| {
                    let size = if config.randomfilesize {
                        // `rand.Int63n(maxblocks) + 1`, matching the
                        // original's "in case we get 0" guard.
                        let mut rng = StdRng::seed_from_u64(app_seed.wrapping_add(file_idx).wrapping_add(1));
                        rng.gen_range(0..config.maxfileblocks) + 1
                    } else {
                        config.maxfileblocks
                    };
                    File::new(
                        size,
                        Box::new(UniformGenerator::new(size, config.read_percent, app_seed.wrapping_add(file_idx))),
                    )
                })
                .collect();
            Application::new(files, config.deletion_percent, build_page_cache(config), app_seed)
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::derive(cli)?;

    let seed = if config.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    } else {
        config.seed
    };

    let cache = build_cache(&config)?;
    let apps = build_applications(&config, seed);
    let mut sim = Simulator::new(config.clone(), cache, apps);

    if config.warmup {
        log::info!("== Warmup ==");
        let mut sink = FileMetricsSink::create("cache-warmup.data")?;
        sim.warmup(&mut sink)?;
    } else {
        // Skip straight to Warming so stats_clear (always required by the
        // state machine) has somewhere to transition from.
        sim.skip_warmup();
    }

    sim.stats_clear();

    log::info!("== Simulation ==");
    let mut sink = FileMetricsSink::create("cache.data")?;
    let start = std::time::Instant::now();
    sim.measure(&mut sink)?;
    sim.close();
    log::info!("total time: {:?}", start.elapsed());

    Ok(())
}
