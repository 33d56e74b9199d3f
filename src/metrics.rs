//! Metric sinks — writes a fixed CSV row shape to persisted output.
//!
//! `FileMetricsSink` mirrors the original's `bufio.Writer` over
//! `os.Create("cache.data")` in
//! `examples/original_source/foocsim/foocsim.go` — a plain buffered writer,
//! not a CSV-formatting crate, since the row shape is fixed and small.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::stats::CacheStats;

/// Receives one `(iteration, stats_delta)` record every `dataperiod` I/Os.
pub trait MetricsSink {
    fn record(&mut self, iteration: u64, stats: &CacheStats, prev: &CacheStats) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Writes the exact row shape:
/// `iteration, read_hit_rate, write_hit_rate, readhits, writehits,
/// deletionhits, reads, writes, deletions, insertions, evictions,
/// invalidations`, all as deltas over the previous sample except
/// `iteration` itself.
pub struct FileMetricsSink {
    writer: BufWriter<File>,
}

impl FileMetricsSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(FileMetricsSink {
            writer: BufWriter::new(file),
        })
    }
}

impl MetricsSink for FileMetricsSink {
    fn record(&mut self, iteration: u64, stats: &CacheStats, prev: &CacheStats) -> io::Result<()> {
        writeln!(self.writer, "{},{}", iteration, stats.dump_delta_row(prev))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Discards every record. Used when a run doesn't care about the CSV
/// artifact (e.g. tests driving [`crate::simulator::Simulator`] directly).
#[derive(Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record(&mut self, _iteration: u64, _stats: &CacheStats, _prev: &CacheStats) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_row_per_record_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.data");
        let mut sink = FileMetricsSink::create(&path).unwrap();

        let prev = CacheStats::new();
        let mut now = CacheStats::new();
        now.reads = 10;
        now.readhits = 5;

        sink.record(0, &now, &prev).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("0,0.5,"));
    }
}
