use crate::errors::SamplerError;
use crate::target::Mode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct SamplerOptions {
    pub label: String,                // feature holding the class label
    pub mode: Mode,
    pub exempt: Vec<String>,          // label values (string form) never resampled
    pub splits: Vec<String>,          // splits to resample
    pub copy_others: bool,            // copy non-selected splits verbatim
    pub shards: usize,                // output files per sampled split; 0 = writer default
    pub seed: Option<u64>,            // None = fresh entropy each run
    pub parallelism: Option<usize>,   // Some(N) to set rayon threads, None to use default
    pub file_concurrency: usize,      // shard files decoded concurrently
    pub progress: bool,
    pub progress_label: Option<String>,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            label: "label".to_string(),
            mode: Mode::Reduce,
            exempt: Vec::new(),
            splits: vec!["train".to_string()],
            copy_others: true,
            shards: 0,
            seed: None,
            parallelism: None,
            file_concurrency: 4,
            progress: true,
            progress_label: None,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl SamplerOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
    pub fn with_exempt<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt = classes.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_splits<I, S>(mut self, splits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.splits = splits.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_copy_others(mut self, yes: bool) -> Self {
        self.copy_others = yes;
        self
    }
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.label.trim().is_empty() {
            return Err(SamplerError::Config("label field name must not be empty".into()));
        }
        if self.splits.is_empty() {
            return Err(SamplerError::Config("at least one split must be selected for sampling".into()));
        }
        Ok(())
    }
}

fn default_label() -> String { "label".to_string() }
fn default_true() -> bool { true }
fn default_splits() -> Vec<String> { vec!["train".to_string()] }

/// On-disk run configuration for the binary (JSON).
///
/// ```json
/// { "input": "data/examples", "output": "data/sampled", "label": "label",
///   "undersample": true, "splits": ["train"], "copy_others": true,
///   "shards": 0, "keep_classes": ["2"], "seed": 7 }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_true")]
    pub undersample: bool,
    #[serde(default = "default_splits")]
    pub splits: Vec<String>,
    #[serde(default = "default_true")]
    pub copy_others: bool,
    #[serde(default)]
    pub shards: usize,
    #[serde(default)]
    pub keep_classes: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl RunConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SamplerError::Config(format!("read {}: {e}", path.display())))?;
        let cfg: RunConfig = serde_json::from_str(&text)
            .map_err(|e| SamplerError::Config(format!("parse {}: {e}", path.display())))?;
        Ok(cfg)
    }

    pub fn to_options(&self) -> SamplerOptions {
        let mut opts = SamplerOptions::default()
            .with_label(&self.label)
            .with_mode(Mode::from_undersample(self.undersample))
            .with_exempt(self.keep_classes.iter().cloned())
            .with_splits(self.splits.iter().cloned())
            .with_copy_others(self.copy_others)
            .with_shards(self.shards)
            .with_seed(self.seed);
        if let Some(n) = self.parallelism {
            opts = opts.with_parallelism(n);
        }
        opts
    }
}
