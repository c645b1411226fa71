#![allow(dead_code)]

use serde_json::json;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Write a compressed `.zst` shard containing the provided JSONL lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Decompress a `.zst` file and collect its non-empty lines.
pub fn decompress_zst_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let dec = zstd::stream::read::Decoder::new(f).unwrap();
    let r = BufReader::new(dec);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// One record line with a unique `id` and an optional integer label.
pub fn int_labeled(id: &str, label: Option<i64>) -> String {
    match label {
        Some(l) => json!({"id": id, "features": {"label": {"int64_list": [l]}, "text": {"bytes_list": [id]}}}),
        None => json!({"id": id, "features": {"text": {"bytes_list": [id]}}}),
    }
    .to_string()
}

/// One record line with a unique `id` and a string label.
pub fn str_labeled(id: &str, label: &str) -> String {
    json!({"id": id, "features": {"label": {"bytes_list": [label]}}}).to_string()
}

/// `n` lines labeled `label`, ids prefixed with `prefix`.
pub fn class_lines(prefix: &str, label: Option<i64>, n: usize) -> Vec<String> {
    (0..n).map(|i| int_labeled(&format!("{prefix}-{i}"), label)).collect()
}

/// Label of an output line (string form), or None when the line has no label.
pub fn label_of(line: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    let f = v.get("features")?.get("label")?;
    if let Some(i) = f.get("int64_list").and_then(|x| x.get(0)) {
        return Some(i.to_string());
    }
    f.get("bytes_list").and_then(|x| x.get(0)).and_then(|x| x.as_str()).map(|s| s.to_string())
}

/// Every output line across all shard files of a directory.
pub fn read_output_lines(dir: &Path) -> Vec<String> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files.iter().flat_map(|p| decompress_zst_lines(p)).collect()
}

/// Build a dataset root with a `train` split spread across two shards
/// (labels 1:100, 2:100, 3:10, unlabeled:5) and a small `eval` split.
pub fn make_dataset_basic() -> PathBuf {
    let base = tempfile::tempdir().unwrap().into_path();
    let input = base.join("input");

    let mut train = Vec::new();
    train.extend(class_lines("a", Some(1), 100));
    train.extend(class_lines("b", Some(2), 100));
    train.extend(class_lines("c", Some(3), 10));
    train.extend(class_lines("n", None, 5));
    let (first, second) = train.split_at(107);
    write_zst_lines(&input.join("Split-train").join("data-00000-of-00002.zst"), first);
    write_zst_lines(&input.join("Split-train").join("data-00001-of-00002.zst"), second);

    let eval = class_lines("e", Some(1), 4);
    write_zst_lines(&input.join("Split-eval").join("data-00000-of-00001.zst"), &eval);

    base
}
