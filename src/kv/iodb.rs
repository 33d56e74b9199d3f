//! `IoDB` — log-structured segmented key/value store.
//!
//! Grounded in `examples/original_source/kvdb/iodb.go` (`KVIoDB`): same
//! segment sizing (`metadata_size = 4 KiB`, `data_size = 1 MiB`), the same
//! `index → file_offset` arithmetic, the same `writing`/`available` channel
//! handoff between the current-segment holder and a dedicated writer
//! goroutine. Two corrections over the Go source, recorded in DESIGN.md:
//! the startup buffer pool no longer double-books buffer 0 into both
//! "current" and `available`, and non-current buffers carry an `assigned`
//! flag so a freshly constructed (all-zero-offset) buffer can never look
//! like a RAM hit for index 0 before it has actually been assigned.
//!
//! The wraparound read-back (`sync`'s `wrapped` branch) fires only on the
//! specific sync whose offset arithmetic wraps past the end of the file,
//! not on every reuse of a segment position.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::KvError;
use crate::kv::KvStore;
use crate::stats::LatencyHistogram;

const DEFAULT_METADATA_SIZE: u64 = 4 * 1024;
const DEFAULT_DATA_SIZE: u64 = 1024 * 1024;
const DEFAULT_SEGMENT_BUFFERS: usize = 32;

struct SegmentBuf {
    /// `[0, data_size)` is the data region, `[data_size, segment_size)` the
    /// appended metadata region.
    buf: Vec<u8>,
    offset: u64,
    /// False until this buffer has actually served as "current" once —
    /// guards against a freshly allocated buffer's zero offset looking like
    /// a RAM hit for index 0.
    assigned: bool,
    dirty: bool,
    meta_cursor: usize,
}

impl SegmentBuf {
    fn new(segment_size: usize) -> Self {
        SegmentBuf {
            buf: vec![0u8; segment_size],
            offset: 0,
            assigned: false,
            dirty: false,
            meta_cursor: 0,
        }
    }
}

#[derive(Default)]
struct IoDbStats {
    ram_hits: AtomicU64,
    storage_hits: AtomicU64,
    seg_skipped: AtomicU64,
    write_latency: Mutex<LatencyHistogram>,
    segment_read_latency: Mutex<LatencyHistogram>,
    read_latency: Mutex<LatencyHistogram>,
}

pub struct IoDb {
    blocksize: u64,
    metadata_size: u64,
    data_size: u64,
    segment_size: u64,
    max_entries: u64,
    num_segments: u64,
    total_size: u64,

    segments: Arc<Vec<Mutex<SegmentBuf>>>,
    current: usize,
    current_offset: u64,

    file: Arc<File>,
    writing_tx: Option<SyncSender<usize>>,
    available_rx: Option<Receiver<usize>>,
    writer: Option<JoinHandle<()>>,
    writer_error: Arc<Mutex<Option<String>>>,
    stats: Arc<IoDbStats>,
}

impl IoDb {
    /// Default segment sizing (4 KiB metadata + 1 MiB data, 32 buffers),
    /// matching `NewKVIoDB`'s constants.
    pub fn new(path: impl AsRef<Path>, blocks: u64, blocksize: u64) -> Result<Self, KvError> {
        Self::with_params(
            path,
            blocks,
            blocksize,
            DEFAULT_METADATA_SIZE,
            DEFAULT_DATA_SIZE,
            DEFAULT_SEGMENT_BUFFERS,
        )
    }

    /// Exposes segment sizing and ring depth for small-scale test and
    /// benchmark configurations.
    pub fn with_params(
        path: impl AsRef<Path>,
        blocks: u64,
        blocksize: u64,
        metadata_size: u64,
        data_size: u64,
        segment_buffers: usize,
    ) -> Result<Self, KvError> {
        let segment_size = metadata_size + data_size;
        let max_entries = data_size / blocksize;
        let num_segments = (blocks / max_entries).max(1);
        let total_size = num_segments * segment_size;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(total_size)?;
        let file = Arc::new(file);

        let mut segments = Vec::with_capacity(segment_buffers);
        for _ in 0..segment_buffers {
            segments.push(Mutex::new(SegmentBuf::new(segment_size as usize)));
        }
        {
            let mut first = segments[0].lock();
            first.assigned = true;
            first.offset = 0;
        }
        let segments = Arc::new(segments);

        let (writing_tx, writing_rx) = sync_channel::<usize>(segment_buffers);
        let (available_tx, available_rx) = sync_channel::<usize>(segment_buffers);
        for i in 1..segment_buffers {
            // Buffer 0 is already in use as "current"; everything else
            // starts out free.
            available_tx.send(i).expect("available channel just created");
        }

        let writer_error = Arc::new(Mutex::new(None));
        let stats = Arc::new(IoDbStats::default());
        let writer = spawn_writer(
            Arc::clone(&segments),
            Arc::clone(&file),
            writing_rx,
            available_tx,
            Arc::clone(&writer_error),
            Arc::clone(&stats),
        );

        Ok(IoDb {
            blocksize,
            metadata_size,
            data_size,
            segment_size,
            max_entries,
            num_segments,
            total_size,
            segments,
            current: 0,
            current_offset: 0,
            file,
            writing_tx: Some(writing_tx),
            available_rx: Some(available_rx),
            writer: Some(writer),
            writer_error,
            stats,
        })
    }

    fn check_writer_error(&self) -> Result<(), KvError> {
        if let Some(msg) = self.writer_error.lock().clone() {
            return Err(KvError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                msg,
            )));
        }
        Ok(())
    }

    /// `(segment_number, intra_offset_within_data_region)` for `index`.
    fn locate(&self, index: u64) -> Result<(u64, u64), KvError> {
        if index >= self.max_entries * self.num_segments {
            return Err(KvError::IndexOutOfRange { index });
        }
        let segment_number = index / self.max_entries;
        let intra = (index % self.max_entries) * self.blocksize;
        Ok((segment_number, intra))
    }

    fn current_segment_number(&self) -> u64 {
        self.current_offset / self.segment_size
    }

    /// Hand the current buffer to the writer, pick up a fresh one, and
    /// advance the write cursor one segment forward.
    fn sync(&mut self) -> Result<(), KvError> {
        self.check_writer_error()?;

        self.writing_tx
            .as_ref()
            .expect("writing channel open while constructed")
            .send(self.current)
            .map_err(|_| KvError::WriterGone)?;

        let new_current = self
            .available_rx
            .as_ref()
            .expect("available channel open while constructed")
            .recv()
            .map_err(|_| KvError::WriterGone)?;
        self.current = new_current;

        let mut next_offset = self.current_offset + self.segment_size;
        let wrapped = next_offset >= self.total_size;
        if wrapped {
            next_offset %= self.total_size;
        }
        self.current_offset = next_offset;

        let mut seg = self.segments[self.current].lock();
        seg.meta_cursor = 0;
        seg.offset = self.current_offset;
        seg.assigned = true;
        seg.dirty = false;
        if wrapped {
            let started = Instant::now();
            self.file.read_exact_at(&mut seg.buf, self.current_offset)?;
            self.stats.segment_read_latency.lock().record(started.elapsed());
            log::debug!("iodb: wraparound read-back at offset {}", self.current_offset);
        }
        Ok(())
    }

    fn put_inner(&mut self, key: &str, value: &[u8], index: u64) -> Result<(), KvError> {
        self.check_writer_error()?;
        if value.len() as u64 != self.blocksize {
            return Err(KvError::ShortWrite {
                expected: self.blocksize as usize,
                got: value.len(),
            });
        }
        let (segment_number, intra) = self.locate(index)?;

        let mut guard = 0;
        while self.current_segment_number() != segment_number {
            self.sync()?;
            guard += 1;
            if guard > self.num_segments {
                return Err(KvError::IndexOutOfRange { index });
            }
        }

        let mut seg = self.segments[self.current].lock();
        let at = intra as usize;
        seg.buf[at..at + self.blocksize as usize].copy_from_slice(value);

        let key_bytes = key.as_bytes();
        let required = 2 + key_bytes.len();
        let meta_base = self.data_size as usize;
        if seg.meta_cursor + required <= self.metadata_size as usize {
            let start = meta_base + seg.meta_cursor;
            seg.buf[start..start + 2].copy_from_slice(&(key_bytes.len() as u16).to_le_bytes());
            seg.buf[start + 2..start + 2 + key_bytes.len()].copy_from_slice(key_bytes);
            seg.meta_cursor += required;
        }
        seg.dirty = true;
        Ok(())
    }

    fn get_inner(&mut self, index: u64) -> Result<Vec<u8>, KvError> {
        self.check_writer_error()?;
        let (segment_number, intra) = self.locate(index)?;
        let file_offset = segment_number * self.segment_size + intra;

        for seg in self.segments.iter() {
            let seg = seg.lock();
            if seg.assigned
                && file_offset >= seg.offset
                && file_offset < seg.offset + self.data_size
            {
                let at = (file_offset - seg.offset) as usize;
                self.stats.ram_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(seg.buf[at..at + self.blocksize as usize].to_vec());
            }
        }

        let started = Instant::now();
        let mut out = vec![0u8; self.blocksize as usize];
        self.file.read_exact_at(&mut out, file_offset)?;
        self.stats.read_latency.lock().record(started.elapsed());
        self.stats.storage_hits.fetch_add(1, Ordering::Relaxed);
        Ok(out)
    }

    /// Snapshot of recorded latencies: `(write, segment-read, read)`.
    pub fn latency_stats(&self) -> (LatencyHistogram, LatencyHistogram, LatencyHistogram) {
        (
            *self.stats.write_latency.lock(),
            *self.stats.segment_read_latency.lock(),
            *self.stats.read_latency.lock(),
        )
    }

    pub fn close_inner(&mut self) -> Result<(), KvError> {
        self.sync()?;
        self.writing_tx.take();
        if let Some(handle) = self.writer.take() {
            handle.join().expect("iodb writer thread panicked");
        }
        let (write_latency, segment_read_latency, read_latency) = self.latency_stats();
        log::info!(
            "iodb: closed (ram_hits={}, storage_hits={}, seg_skipped={}, \
             write_latency_us={:.2}, segment_read_latency_us={:.2}, read_latency_us={:.2})",
            self.stats.ram_hits.load(Ordering::Relaxed),
            self.stats.storage_hits.load(Ordering::Relaxed),
            self.stats.seg_skipped.load(Ordering::Relaxed),
            write_latency.mean_micros(),
            segment_read_latency.mean_micros(),
            read_latency.mean_micros(),
        );
        Ok(())
    }
}

fn spawn_writer(
    segments: Arc<Vec<Mutex<SegmentBuf>>>,
    file: Arc<File>,
    writing_rx: Receiver<usize>,
    available_tx: SyncSender<usize>,
    writer_error: Arc<Mutex<Option<String>>>,
    stats: Arc<IoDbStats>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for index in writing_rx.iter() {
            let mut seg = segments[index].lock();
            if seg.dirty {
                let started = Instant::now();
                if let Err(e) = file.write_all_at(&seg.buf, seg.offset) {
                    *writer_error.lock() = Some(e.to_string());
                } else {
                    stats.write_latency.lock().record(started.elapsed());
                    seg.dirty = false;
                }
            } else {
                stats.seg_skipped.fetch_add(1, Ordering::Relaxed);
                log::warn!("iodb: writer skipped clean segment buffer {index}");
            }
            // Once a buffer leaves the writer for the free pool it no
            // longer represents its old offset for read purposes — only
            // the current buffer (or one still in flight to the writer)
            // is a valid RAM-hit candidate.
            seg.assigned = false;
            drop(seg);
            // Receiver side may already be gone if close() raced a panic
            // elsewhere; this thread still exits cleanly on the next
            // `writing_rx` disconnect either way.
            let _ = available_tx.send(index);
        }
    })
}

impl KvStore for IoDb {
    fn put(&mut self, key: &str, value: &[u8], index: u64) -> Result<(), KvError> {
        self.put_inner(key, value, index)
    }

    fn get(&mut self, _key: &str, index: u64) -> Result<Vec<u8>, KvError> {
        self.get_inner(index)
    }

    fn delete(&mut self, _key: &str, _index: u64) -> Result<(), KvError> {
        // Log-structured: entries are abandoned by ring rotation, not
        // deleted in place.
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.close_inner() {
            log::warn!("iodb: error while closing: {e}");
        }
    }
}
