use crate::classify::ExemptSet;
use crate::concurrency::map_files_limited;
use crate::config::SamplerOptions;
use crate::progress::{make_count_progress, make_progress_bar_labeled, total_file_size};
use crate::record::Record;
use crate::sampler::{SampleStats, SamplingPlan};
use crate::sink::{resolve_shard_count, ShardedRecordSink};
use crate::splits::{copy_split, discover_splits, list_shard_files, split_dir};
use crate::target::Mode;
use crate::util::init_tracing_once;
use crate::zstd_jsonl::for_each_record;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Stem of sampled output shard files.
const OUTPUT_STEM: &str = "data";

#[derive(Clone, Default)]
pub struct LabelSampler {
    pub(crate) opts: SamplerOptions,
}

/// What happened to one split during `run()`.
#[derive(Debug)]
pub enum SplitOutcome {
    Sampled { stats: SampleStats, files: Vec<PathBuf> },
    Copied { files: usize },
    Omitted,
}

#[derive(Debug)]
pub struct SplitReport {
    pub split: String,
    pub outcome: SplitOutcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub splits: Vec<SplitReport>,
}

impl RunReport {
    pub fn get(&self, split: &str) -> Option<&SplitOutcome> {
        self.splits.iter().find(|r| r.split == split).map(|r| &r.outcome)
    }
}

impl LabelSampler {
    pub fn new() -> Self {
        Self { opts: SamplerOptions::default() }
    }

    pub fn from_options(opts: SamplerOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn label(mut self, field: impl Into<String>) -> Self { self.opts = self.opts.with_label(field); self }
    pub fn mode(mut self, mode: Mode) -> Self { self.opts = self.opts.with_mode(mode); self }
    pub fn undersample(self) -> Self { self.mode(Mode::Reduce) }
    pub fn oversample(self) -> Self { self.mode(Mode::Expand) }
    pub fn exempt<I, S>(mut self, classes: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_exempt(classes); self }
    pub fn splits<I, S>(mut self, splits: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_splits(splits); self }
    pub fn copy_others(mut self, yes: bool) -> Self { self.opts = self.opts.with_copy_others(yes); self }
    pub fn shards(mut self, shards: usize) -> Self { self.opts = self.opts.with_shards(shards); self }
    pub fn seed(mut self, seed: u64) -> Self { self.opts = self.opts.with_seed(Some(seed)); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn file_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_file_concurrency(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self { self.opts = self.opts.with_io_buffers(read_bytes, write_bytes); self }

    pub fn options(&self) -> &SamplerOptions {
        &self.opts
    }

    /// Immutable plan handed to the core for one invocation.
    pub fn plan(&self) -> SamplingPlan {
        SamplingPlan::new(self.opts.label.clone(), self.opts.mode)
            .with_exempt(ExemptSet::new(self.opts.exempt.iter().cloned()))
            .with_seed(self.opts.seed)
    }

    /// Rebalance an in-memory set of records.
    pub fn sample_records(&self, records: Vec<Record>) -> Result<(Vec<Record>, SampleStats)> {
        self.opts.validate()?;
        Ok(self.plan().run(records)?)
    }

    /// Read every shard file of one split, rebalance, and write sharded output.
    pub fn sample_split(&self, input_dir: &Path, output_dir: &Path) -> Result<(SampleStats, Vec<PathBuf>)> {
        init_tracing_once();
        self.opts.validate()?;
        self.configure_threads();

        let records = self.read_split(input_dir)?;
        tracing::info!("Read {} records from {}", records.len(), input_dir.display());

        let (merged, stats) = self.plan().run(records)?;

        fs::create_dir_all(output_dir).with_context(|| format!("create {}", output_dir.display()))?;
        let files = self.write_split(output_dir, &merged)?;
        tracing::info!(
            "Wrote {} records ({} classes x {} + {} null + {} exempt) to {} files in {}",
            stats.total_out,
            stats.classes(),
            stats.target_size,
            stats.null,
            stats.exempt,
            files.len(),
            output_dir.display()
        );
        Ok((stats, files))
    }

    /// Process every split under `input_root`: selected splits are rebalanced,
    /// the rest are copied verbatim when `copy_others` is set.
    pub fn run(&self, input_root: &Path, output_root: &Path) -> Result<RunReport> {
        init_tracing_once();
        self.opts.validate()?;

        let discovered = discover_splits(input_root);
        if discovered.is_empty() {
            tracing::warn!("No Split-* directories found under {}", input_root.display());
        }
        for wanted in &self.opts.splits {
            if !discovered.contains_key(wanted) {
                tracing::warn!("Requested split '{}' not found under {}", wanted, input_root.display());
            }
        }

        let mut report = RunReport::default();
        for (split, in_dir) in &discovered {
            let out_dir = split_dir(output_root, split);
            let outcome = if self.opts.splits.iter().any(|s| s == split) {
                tracing::info!("Sampling split '{}' ({:?})", split, self.opts.mode);
                let (stats, files) = self
                    .sample_split(in_dir, &out_dir)
                    .with_context(|| format!("sampling split '{split}'"))?;
                SplitOutcome::Sampled { stats, files }
            } else if self.opts.copy_others {
                let n = copy_split(in_dir, &out_dir).with_context(|| format!("copying split '{split}'"))?;
                tracing::info!("Copied split '{}' ({} files)", split, n);
                SplitOutcome::Copied { files: n }
            } else {
                tracing::debug!("Omitting split '{}'", split);
                SplitOutcome::Omitted
            };
            report.splits.push(SplitReport { split: split.clone(), outcome });
        }
        Ok(report)
    }

    fn configure_threads(&self) {
        if let Some(n) = self.opts.parallelism {
            if n > 0 {
                rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok();
            }
        }
    }

    fn read_split(&self, input_dir: &Path) -> Result<Vec<Record>> {
        let files = list_shard_files(input_dir)?;
        if files.is_empty() {
            tracing::warn!("No shard files in {}", input_dir.display());
        }
        let read_buf = self.opts.read_buffer_bytes;
        let pb = if self.opts.progress {
            let label = self.opts.progress_label.as_deref().unwrap_or("Reading records");
            Some(make_progress_bar_labeled(total_file_size(&files), Some(label)))
        } else {
            None
        };

        let parts = map_files_limited(&files, self.opts.file_concurrency, |path| {
            let mut out = Vec::new();
            for_each_record(
                path,
                read_buf,
                |delta| {
                    if let Some(pb) = &pb {
                        pb.inc(delta);
                    }
                },
                |r| {
                    out.push(r);
                    Ok(())
                },
            )
            .with_context(|| format!("reading {}", path.display()))?;
            Ok(out)
        })?;
        if let Some(pb) = &pb {
            pb.finish_with_message("records read");
        }
        Ok(parts.into_iter().flatten().collect())
    }

    fn write_split(&self, output_dir: &Path, records: &[Record]) -> Result<Vec<PathBuf>> {
        let shards = resolve_shard_count(self.opts.shards, records.len());
        let sink = ShardedRecordSink::create(output_dir, OUTPUT_STEM, shards, self.opts.write_buffer_bytes)?;
        let pb = self.opts.progress.then(|| make_count_progress(records.len() as u64, "Writing records"));
        for r in records {
            sink.write(r)?;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = &pb {
            pb.finish_with_message("records written");
        }
        sink.finalize()
    }
}
