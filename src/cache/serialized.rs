//! Concurrency wrapping for `Simple` and `IoCacheKvDB`.
//!
//! The original source serializes cache access with a goroutine reading a
//! buffered channel; this plays the same role with a dedicated
//! `std::thread` and `std::sync::mpsc::sync_channel` carrying request
//! variants. All engine state lives on the worker thread; callers only
//! ever touch the channel, so ordering is strict FIFO per caller.

use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread::JoinHandle;

use crate::cache::Cache;
use crate::stats::CacheStats;

const REQUEST_QUEUE_DEPTH: usize = 256;

enum Request {
    Write(String, String),
    Read(String, String, SyncSender<bool>),
    Delete(String),
    Invalidate(String),
    Stats(SyncSender<CacheStats>),
    StatsClear,
}

/// Wraps any [`Cache`] behind a single worker thread. The wrapped engine is
/// never touched from the caller's thread again after construction.
pub struct SerializedCache {
    tx: Option<SyncSender<Request>>,
    handle: Option<JoinHandle<()>>,
}

impl SerializedCache {
    pub fn new(mut inner: Box<dyn Cache>) -> Self {
        let (tx, rx) = sync_channel::<Request>(REQUEST_QUEUE_DEPTH);
        let handle = std::thread::spawn(move || {
            for req in rx.iter() {
                match req {
                    Request::Write(obj, chunk) => inner.write(&obj, &chunk),
                    Request::Read(obj, chunk, resp) => {
                        let hit = inner.read(&obj, &chunk);
                        let _ = resp.send(hit);
                    }
                    Request::Delete(obj) => inner.delete(&obj),
                    Request::Invalidate(key) => inner.invalidate(&key),
                    Request::Stats(resp) => {
                        let _ = resp.send(inner.stats());
                    }
                    Request::StatsClear => inner.stats_clear(),
                }
            }
            inner.close();
        });
        SerializedCache {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    fn send(&self, req: Request) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(req);
        }
    }
}

impl Cache for SerializedCache {
    fn write(&mut self, obj: &str, chunk: &str) {
        self.send(Request::Write(obj.to_string(), chunk.to_string()));
    }

    fn read(&mut self, obj: &str, chunk: &str) -> bool {
        let (resp_tx, resp_rx) = sync_channel(1);
        self.send(Request::Read(obj.to_string(), chunk.to_string(), resp_tx));
        resp_rx.recv().unwrap_or(false)
    }

    fn delete(&mut self, obj: &str) {
        self.send(Request::Delete(obj.to_string()));
    }

    fn invalidate(&mut self, key: &str) {
        self.send(Request::Invalidate(key.to_string()));
    }

    fn stats(&self) -> CacheStats {
        let (resp_tx, resp_rx) = sync_channel(1);
        self.send(Request::Stats(resp_tx));
        resp_rx.recv().unwrap_or_default()
    }

    fn stats_clear(&mut self) {
        self.send(Request::StatsClear);
    }

    fn close(&mut self) {
        // Dropping the sender closes the channel; the worker drains
        // whatever is queued, closes the inner engine, then returns.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            handle.join().expect("serialized cache worker panicked");
        }
    }
}

impl Drop for SerializedCache {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::simple::SimpleCache;

    #[test]
    fn round_trips_through_the_worker_thread() {
        let mut c = SerializedCache::new(Box::new(SimpleCache::new(4, true)));
        c.write("a", "0");
        assert!(c.read("a", "0"));
        assert_eq!(c.stats().writes, 1);
        c.close();
    }

    #[test]
    fn close_is_idempotent() {
        let mut c = SerializedCache::new(Box::new(SimpleCache::new(4, true)));
        c.write("a", "0");
        c.close();
        c.close();
    }
}
