//! Cache engines.
//!
//! The shared contract mirrors `examples/original_source/caches/cache.go`'s
//! `Caches` interface, generalized to a Rust trait. Every engine keeps its
//! own [`CacheStats`] rather than returning one through a `Copy`-the-pointer
//! pattern — `stats()` already hands back an owned snapshot, which is what
//! the Go `Copy()` method simulated by hand.

pub mod blocks;
pub mod buffer_cache;
pub mod iocache;
pub mod iocache_kvdb;
pub mod null;
pub mod serialized;
pub mod simple;

use crate::cache::buffer_cache::BufferCache;
use crate::config::{CacheType, Config};
use crate::error::ConfigError;
use crate::kv::KvStore;
use crate::stats::CacheStats;

/// Shared behavior across `Simple`, `Null`, `IoCache` and `IoCacheKvDB`.
pub trait Cache: Send {
    fn write(&mut self, obj: &str, chunk: &str);
    fn read(&mut self, obj: &str, chunk: &str) -> bool;
    fn delete(&mut self, obj: &str);
    fn invalidate(&mut self, key: &str);
    fn stats(&self) -> CacheStats;
    fn stats_clear(&mut self);
    fn close(&mut self);
}

/// Tagged factory mirroring the `switch args.cachetype` dispatch in
/// `examples/original_source/foocsim/foocsim.go`'s `main()`.
pub fn build_cache(config: &Config) -> Result<Box<dyn Cache>, ConfigError> {
    let cacheblocks = config.cacheblocks as usize;
    match config.cachetype {
        CacheType::Simple => Ok(Box::new(simple::SimpleCache::new(
            cacheblocks,
            config.writethrough,
        ))),
        CacheType::Null => Ok(Box::new(null::NullCache::new())),
        CacheType::Iocache => Ok(Box::new(iocache::IoCache::new(
            cacheblocks,
            config.writethrough,
        ))),
        CacheType::Boltdb | CacheType::Leveldb | CacheType::Rocksdb => {
            Err(ConfigError::UnsupportedBackend(config.cachetype.to_string()))
        }
        CacheType::Iodb => {
            let db: Box<dyn KvStore> = Box::new(crate::kv::iodb::IoDb::new(
                "cache.iodb",
                config.cacheblocks,
                config.blocksize,
            )?);
            // bcsize is a fraction of cachesize_bytes (see Config::derive);
            // zero disables the buffer cache rather than building a
            // zero-capacity one.
            let buffer_cache = if config.bcsize > 0 {
                Some(BufferCache::new(config.bcsize, config.blocksize))
            } else {
                None
            };
            Ok(Box::new(iocache_kvdb::IoCacheKvDb::with_buffer_cache(
                cacheblocks,
                config.writethrough,
                config.blocksize as usize,
                db,
                buffer_cache,
            )))
        }
    }
}
