//! Concurrency helper: limit the number of shard files decoded in parallel.

use anyhow::Result;
use rayon::prelude::*;
use std::path::PathBuf;

/// Map over shard files with at most `limit` decoders in flight.
/// Results come back in input order.
pub fn map_files_limited<T, F>(files: &[PathBuf], limit: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Sync + Fn(&PathBuf) -> Result<T>,
{
    if limit <= 1 {
        return files.iter().map(&f).collect();
    }
    let mut out = Vec::with_capacity(files.len());
    for chunk in files.chunks(limit) {
        let part: Vec<T> = chunk.par_iter().map(|p| f(p)).collect::<Result<_>>()?;
        out.extend(part);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_propagates_errors() {
        let files: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("f{i}"))).collect();
        let names = map_files_limited(&files, 2, |p| Ok(p.display().to_string())).unwrap();
        assert_eq!(names, vec!["f0", "f1", "f2", "f3", "f4"]);

        let err = map_files_limited(&files, 3, |p| {
            if p.ends_with("f3") { anyhow::bail!("boom") } else { Ok(()) }
        });
        assert!(err.is_err());
    }
}
