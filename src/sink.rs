use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use zstd::stream::write::Encoder as ZstdEncoder;

use crate::record::Record;
use crate::util::{create_with_backoff, replace_file_atomic_backoff};

/// Records per shard when the caller leaves the shard count to the writer.
const DEFAULT_RECORDS_PER_SHARD: usize = 64 * 1024;
const DEFAULT_MAX_SHARDS: usize = 16;

/// Resolve a requested shard count; 0 lets the writer pick from the record count.
pub fn resolve_shard_count(requested: usize, total_records: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    total_records
        .div_ceil(DEFAULT_RECORDS_PER_SHARD)
        .clamp(1, DEFAULT_MAX_SHARDS)
}

/// Sharded zstd JSONL writer. Records are spread round-robin across shards.
///
/// File layout:
///   <dir>/_staging/<stem>-XXXXX-of-YYYYY.inprogress   (temp)
///   <dir>/<stem>-XXXXX-of-YYYYY.jsonl.zst             (final, after finalize())
///
/// `write()` is safe to call from several threads (per-shard mutex).
pub struct ShardedRecordSink {
    writers: Vec<Mutex<ZstdEncoder<'static, BufWriter<File>>>>,
    tmp_paths: Vec<PathBuf>,
    final_paths: Vec<PathBuf>,
    staging: PathBuf,
    next: AtomicUsize,
}

impl ShardedRecordSink {
    pub fn create(dir: &Path, stem: &str, shards: usize, write_buf: usize) -> Result<Self> {
        let shards = shards.max(1);
        let staging = dir.join("_staging");
        fs::create_dir_all(&staging).with_context(|| format!("create {}", staging.display()))?;

        let mut writers = Vec::with_capacity(shards);
        let mut tmp_paths = Vec::with_capacity(shards);
        let mut final_paths = Vec::with_capacity(shards);

        for i in 0..shards {
            let name = format!("{}-{:05}-of-{:05}", stem, i, shards);
            let tmp = staging.join(format!("{name}.inprogress"));
            let final_p = dir.join(format!("{name}.jsonl.zst"));
            let f = create_with_backoff(&tmp, 16, 50)
                .with_context(|| format!("create {}", tmp.display()))?;
            let enc = ZstdEncoder::new(BufWriter::with_capacity(write_buf, f), 3)
                .with_context(|| format!("zstd encoder {}", tmp.display()))?;
            writers.push(Mutex::new(enc));
            tmp_paths.push(tmp);
            final_paths.push(final_p);
        }

        Ok(Self { writers, tmp_paths, final_paths, staging, next: AtomicUsize::new(0) })
    }

    pub fn shard_count(&self) -> usize {
        self.writers.len()
    }

    /// Write one record's payload as a line on the next shard.
    pub fn write(&self, record: &Record) -> Result<()> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.writers.len();
        let mut guard = self.writers[idx].lock();
        guard.write_all(record.raw().as_bytes())?;
        guard.write_all(b"\n")?;
        Ok(())
    }

    /// Finish every zstd frame, then promote staging files to their final names.
    /// Returns the final paths in shard order.
    pub fn finalize(self) -> Result<Vec<PathBuf>> {
        for (w, tmp) in self.writers.into_iter().zip(self.tmp_paths.iter()) {
            let enc = w.into_inner();
            let mut inner = enc.finish().with_context(|| format!("finish {}", tmp.display()))?;
            inner.flush().with_context(|| format!("flush {}", tmp.display()))?;
        }

        for (tmp, final_p) in self.tmp_paths.iter().zip(self.final_paths.iter()) {
            replace_file_atomic_backoff(tmp, final_p)?;
        }
        // Staging is empty now; leaving it behind is harmless if removal fails.
        let _ = fs::remove_dir(&self.staging);

        Ok(self.final_paths)
    }
}

/// Write a merged stream to `dir` with `shards` files (0 = writer default).
pub fn write_records(dir: &Path, stem: &str, records: &[Record], shards: usize, write_buf: usize) -> Result<Vec<PathBuf>> {
    let shards = resolve_shard_count(shards, records.len());
    let sink = ShardedRecordSink::create(dir, stem, shards, write_buf)?;
    for r in records {
        sink.write(r)?;
    }
    sink.finalize()
}
