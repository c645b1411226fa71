//! In-memory resampling core: extract → partition → count → select → resample → merge.
//!
//! Counting must see the whole countable bucket before the target is chosen;
//! that is the only barrier. Everything else runs data-parallel on rayon.

use crate::classify::{ExemptSet, Partitioned};
use crate::counting::{count_per_label, ClassCount};
use crate::errors::SamplerError;
use crate::label::LabelExtractor;
use crate::merge::merge_outputs;
use crate::record::Record;
use crate::resample::{group_by_label, Resampler};
use crate::target::{select_target_size, Mode};
use rayon::prelude::*;

/// Immutable per-run parameters threaded into every stage.
#[derive(Clone, Debug)]
pub struct SamplingPlan {
    pub extractor: LabelExtractor,
    pub exempt: ExemptSet,
    pub mode: Mode,
    pub seed: Option<u64>,
}

/// What one invocation of the core observed and produced.
#[derive(Clone, Debug, Default)]
pub struct SampleStats {
    pub total_in: usize,
    pub null: usize,
    pub exempt: usize,
    pub countable_in: usize,
    pub per_class_in: ClassCount,
    pub target_size: usize,
    pub total_out: usize,
}

impl SampleStats {
    pub fn classes(&self) -> usize {
        self.per_class_in.len()
    }
}

impl SamplingPlan {
    pub fn new(label_field: impl Into<String>, mode: Mode) -> Self {
        Self {
            extractor: LabelExtractor::new(label_field),
            exempt: ExemptSet::default(),
            mode,
            seed: None,
        }
    }

    pub fn with_exempt(mut self, exempt: ExemptSet) -> Self {
        self.exempt = exempt;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Label and route every record into its bucket.
    pub fn partition(&self, records: Vec<Record>) -> Partitioned {
        records
            .into_par_iter()
            .map(|r| self.extractor.label(r))
            .fold(Partitioned::default, |mut p, (label, record)| {
                p.push(label, record, &self.exempt);
                p
            })
            .reduce(Partitioned::default, Partitioned::merge)
    }

    /// Run the full core over a materialized split.
    pub fn run(&self, records: Vec<Record>) -> Result<(Vec<Record>, SampleStats), SamplerError> {
        let total_in = records.len();
        let Partitioned { null, exempt, countable } = self.partition(records);

        let per_class_in = count_per_label(&countable);
        let target_size = select_target_size(&per_class_in, self.mode);
        tracing::info!(
            null = null.len(),
            exempt = exempt.len(),
            countable = countable.len(),
            classes = per_class_in.len(),
            target_size,
            mode = ?self.mode,
            "partitioned records"
        );

        let mut stats = SampleStats {
            total_in,
            null: null.len(),
            exempt: exempt.len(),
            countable_in: countable.len(),
            per_class_in,
            target_size,
            total_out: 0,
        };

        let groups = group_by_label(countable);
        let resampled = Resampler::new(self.mode, target_size, self.seed).resample_all(&groups)?;
        drop(groups);

        let merged = merge_outputs(resampled, null, exempt);
        stats.total_out = merged.len();
        Ok((merged, stats))
    }
}
