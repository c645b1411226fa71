mod config;
mod errors;
mod record;
mod label;
mod classify;
mod counting;
mod target;
mod resample;
mod merge;
mod sampler;

mod zstd_jsonl;
mod sink;
mod splits;
mod progress;
mod concurrency;
mod util;
mod pipeline;

pub use crate::config::{RunConfig, SamplerOptions};
pub use crate::errors::SamplerError;
pub use crate::pipeline::{LabelSampler, RunReport, SplitOutcome, SplitReport};

// Core data model and stages.
pub use crate::record::{Feature, Record};
pub use crate::label::{LabelExtractor, LabelValue};
pub use crate::classify::{classify, partition, Bucket, ExemptSet, Partitioned};
pub use crate::counting::{count_per_label, merge_counts, ClassCount};
pub use crate::target::{select_target_size, Mode};
pub use crate::resample::{group_by_label, ClassGroup, Resampler};
pub use crate::merge::merge_outputs;
pub use crate::sampler::{SampleStats, SamplingPlan};

// Record source / sink boundary.
pub use crate::zstd_jsonl::{for_each_record, read_records};
pub use crate::sink::{resolve_shard_count, write_records, ShardedRecordSink};
pub use crate::splits::{copy_split, discover_splits, list_shard_files, split_dir, SPLIT_DIR_PREFIX};

pub use crate::util::init_tracing_once;
