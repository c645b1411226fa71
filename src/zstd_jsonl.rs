use anyhow::{Context, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::errors::SamplerError;
use crate::record::Record;
use crate::util::open_with_backoff;

/// A `Read` wrapper that counts compressed bytes read and notes whether the
/// underlying file itself failed, so decode errors can be told apart from disk errors.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
    source_failed: Arc<AtomicBool>,
}
impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf).map_err(|e| {
            self.source_failed.store(true, Ordering::Relaxed);
            e
        })?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

#[inline]
fn is_zstd(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "zst" || e == "zstd")
}

/// Stream one shard file record-by-record. `.zst` files are decoded with zstd;
/// anything else is read as plain JSONL. Blank lines are skipped.
///
/// Any failure is returned, never skipped. A bad zstd frame, invalid UTF-8, or a
/// bad record line is `SamplerError::RecordDecode`; a failing read of the file
/// itself is `SamplerError::Io`. `on_progress` receives compressed-byte deltas.
pub fn for_each_record(
    path: &Path,
    read_buf_bytes: usize,
    mut on_progress: impl FnMut(u64),
    mut on_record: impl FnMut(Record) -> Result<()>,
) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)
        .map_err(SamplerError::Io)
        .with_context(|| format!("open {}", path.display()))?;
    let counter = Arc::new(AtomicU64::new(0));
    let source_failed = Arc::new(AtomicBool::new(false));
    let cnt = CountingReader { inner: file, counter: counter.clone(), source_failed: source_failed.clone() };

    let cap = read_buf_bytes.max(8 * 1024);
    let mut reader: Box<dyn BufRead> = if is_zstd(path) {
        let mut decoder = Decoder::new(cnt).with_context(|| format!("zstd init {}", path.display()))?;
        // Large frames otherwise fail with "Frame requires too much memory".
        decoder.window_log_max(31)?;
        Box::new(BufReader::with_capacity(cap, decoder))
    } else {
        Box::new(BufReader::with_capacity(cap, cnt))
    };

    let mut buf = String::with_capacity(16 * 1024);
    let mut last = 0u64;
    let mut line_no = 0u64;
    loop {
        buf.clear();
        let n = match reader.read_line(&mut buf) {
            Ok(n) => n,
            Err(e) if source_failed.load(Ordering::Relaxed) => {
                return Err(SamplerError::Io(e))
                    .with_context(|| format!("read {} after line {}", path.display(), line_no));
            }
            Err(e) => {
                return Err(SamplerError::RecordDecode {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    reason: e.to_string(),
                }
                .into());
            }
        };
        let cur = counter.load(Ordering::Relaxed);
        if cur > last {
            on_progress(cur - last);
            last = cur;
        }
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let record = Record::parse(line).map_err(|e| SamplerError::RecordDecode {
            path: path.to_path_buf(),
            line: line_no,
            reason: e.to_string(),
        })?;
        on_record(record)?;
    }
    Ok(())
}

/// Read a whole shard file into memory.
pub fn read_records(path: &Path, read_buf_bytes: usize) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    for_each_record(path, read_buf_bytes, |_| {}, |r| {
        out.push(r);
        Ok(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_zst(path: &Path, lines: &[&str]) {
        let f = File::create(path).unwrap();
        let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
        for l in lines {
            writeln!(&mut enc, "{}", l).unwrap();
        }
        enc.finish().unwrap();
    }

    #[test]
    fn reads_zst_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        let lines = [
            r#"{"features":{"label":{"int64_list":[1]}}}"#,
            "",
            r#"{"features":{"label":{"bytes_list":["a"]}}}"#,
        ];
        let zst = dir.path().join("data-00000.zst");
        write_zst(&zst, &lines);
        assert_eq!(read_records(&zst, 8 * 1024).unwrap().len(), 2);

        let plain = dir.path().join("data-00001.jsonl");
        std::fs::write(&plain, lines.join("\n")).unwrap();
        let recs = read_records(&plain, 8 * 1024).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].raw(), lines[0]);
    }

    #[test]
    fn bad_line_reports_path_and_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let zst = dir.path().join("bad.zst");
        write_zst(&zst, &[r#"{"features":{}}"#, "{oops"]);
        let err = read_records(&zst, 8 * 1024).unwrap_err();
        match err.downcast_ref::<SamplerError>() {
            Some(SamplerError::RecordDecode { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected RecordDecode, got {other:?}"),
        }
    }

    fn decode_line(err: &anyhow::Error) -> Option<u64> {
        match err.downcast_ref::<SamplerError>() {
            Some(SamplerError::RecordDecode { line, .. }) => Some(*line),
            _ => None,
        }
    }

    #[test]
    fn corrupt_frame_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let zst = dir.path().join("corrupt.zst");
        std::fs::write(&zst, b"definitely not zstd").unwrap();
        let err = read_records(&zst, 8 * 1024).unwrap_err();
        assert_eq!(decode_line(&err), Some(1), "got {err:#}");
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("x.jsonl");
        let mut bytes = br#"{"features":{}}"#.to_vec();
        bytes.extend_from_slice(b"\n{\"features\":{\"t\":{\"bytes_list\":[\"\xff\"]}}}\n");
        std::fs::write(&plain, bytes).unwrap();
        let err = read_records(&plain, 8 * 1024).unwrap_err();
        assert_eq!(decode_line(&err), Some(2), "got {err:#}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(&dir.path().join("absent.zst"), 8 * 1024).unwrap_err();
        assert_eq!(decode_line(&err), None);
        assert!(matches!(err.downcast_ref::<SamplerError>(), Some(SamplerError::Io(_))), "got {err:#}");
    }
}
