//! Workload driver — applications, files, and block generators.
//!
//! Grounded in `examples/original_source/iogenerator/app.go` and `file.go`.
//! The Go `File` delegates generation entirely to the external SPC-1
//! generator (`goioworkload/spc1`), treated here as an opaque
//! `(block_index, is_read)` source; [`BlockGenerator`] is the trait
//! boundary that keeps that pluggability while providing a runnable
//! default ([`UniformGenerator`]) so the crate works end to end without the
//! external SPC-1/Zipf crates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::Cache;

/// Opaque source of `(block_index, is_read)` pairs, standing in for the
/// Zipf and SPC-1 generators that remain out of scope for this repository.
pub trait BlockGenerator: Send {
    fn gen(&mut self) -> (u64, bool);

    /// Rewinds the generator back to its initial seed, so a later phase can
    /// replay the exact same draw sequence as an earlier one.
    fn reset(&mut self);
}

/// Uniformly-random offset selection with an integer read/write mix,
/// matching the original's `math/rand`-seeded approach
/// (`rand.New(rand.NewSource(seed))`) but without SPC-1's locality model.
pub struct UniformGenerator {
    size_in_blocks: u64,
    read_percent: i64,
    seed: u64,
    rng: StdRng,
}

impl UniformGenerator {
    pub fn new(size_in_blocks: u64, read_percent: i64, seed: u64) -> Self {
        assert!(size_in_blocks > 0, "file size must be at least one block");
        UniformGenerator {
            size_in_blocks,
            read_percent,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BlockGenerator for UniformGenerator {
    fn gen(&mut self) -> (u64, bool) {
        let offset = self.rng.gen_range(0..self.size_in_blocks);
        let is_read = self.rng.gen_range(0..100) < self.read_percent;
        (offset, is_read)
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

/// A workload file: its block extent and the generator driving access to it.
pub struct File {
    size_in_blocks: u64,
    generator: Box<dyn BlockGenerator>,
}

impl File {
    pub fn new(size_in_blocks: u64, generator: Box<dyn BlockGenerator>) -> Self {
        File {
            size_in_blocks,
            generator,
        }
    }

    pub fn size_in_blocks(&self) -> u64 {
        self.size_in_blocks
    }

    pub fn gen(&mut self) -> (u64, bool) {
        self.generator.gen()
    }

    pub fn reset(&mut self) {
        self.generator.reset();
    }
}

/// One simulated client: a set of files, a deletion rate, and the page
/// cache it drives reads and writes through before they reach the main
/// cache.
pub struct Application {
    files: Vec<File>,
    deletion_percent: i64,
    seed: u64,
    rng: StdRng,
    page_cache: Box<dyn Cache>,
    main_cache_writes: u64,
    main_cache_reads: u64,
}

impl Application {
    pub fn new(files: Vec<File>, deletion_percent: i64, page_cache: Box<dyn Cache>, seed: u64) -> Self {
        assert!(!files.is_empty(), "an application needs at least one file");
        Application {
            files,
            deletion_percent,
            seed,
            rng: StdRng::seed_from_u64(seed),
            page_cache,
            main_cache_writes: 0,
            main_cache_reads: 0,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Rewinds the file-selection/deletion-roll RNG and every file's
    /// generator back to their initial seeds, so a later phase replays the
    /// same request sequence as an earlier one. Cache state (including the
    /// page cache's) is left untouched — only the source of requests
    /// rewinds, not what was done with them.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        for file in &mut self.files {
            file.reset();
        }
    }

    /// One `gen()` step:
    /// 1. pick a file uniformly at random
    /// 2. draw `(block, is_read)` from its generator
    /// 3. stringify `(file, block)` as the cache key components
    /// 4. roll the deletion dice first
    /// 5. on read, try the page cache before the main cache
    /// 6. on write, write through the page cache then the main cache
    pub fn gen(&mut self, main_cache: &mut dyn Cache) {
        let file_index = self.rng.gen_range(0..self.files.len());
        let (block, is_read) = self.files[file_index].gen();
        let obj = file_index.to_string();
        let chunk = block.to_string();

        if self.rng.gen_range(0..100) < self.deletion_percent {
            main_cache.delete(&obj);
            return;
        }

        if is_read {
            if !self.page_cache.read(&obj, &chunk) {
                self.main_cache_reads += 1;
                main_cache.read(&obj, &chunk);
            }
        } else {
            self.page_cache.write(&obj, &chunk);
            self.main_cache_writes += 1;
            main_cache.write(&obj, &chunk);
        }
    }

    pub fn page_cache_stats(&self) -> crate::stats::CacheStats {
        self.page_cache.stats()
    }

    pub fn close(&mut self) {
        self.page_cache.close();
    }
}
