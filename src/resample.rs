//! Class-wise resampling to one global target size.
//!
//! `Reduce` draws without replacement, `Expand` draws i.i.d. with replacement.
//! Every class goes through the same policy, including the class that already
//! sits at the target size: under `Expand` it is redrawn and may contain repeats.

use crate::errors::SamplerError;
use crate::label::LabelValue;
use crate::record::Record;
use crate::target::Mode;
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Records of one countable class.
pub type ClassGroup = (LabelValue, Vec<Record>);

/// Group the countable bucket by label. Groups come back sorted by label so a
/// seeded run is reproducible regardless of hash-map iteration order.
pub fn group_by_label<I>(countable: I) -> Vec<ClassGroup>
where
    I: IntoIterator<Item = (LabelValue, Record)>,
{
    let mut map: AHashMap<LabelValue, Vec<Record>> = AHashMap::new();
    for (label, record) in countable {
        map.entry(label).or_default().push(record);
    }
    let mut groups: Vec<ClassGroup> = map.into_iter().collect();
    groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    groups
}

#[derive(Clone, Debug)]
pub struct Resampler {
    mode: Mode,
    target: usize,
    seed: Option<u64>,
}

impl Resampler {
    pub fn new(mode: Mode, target: usize, seed: Option<u64>) -> Self {
        Self { mode, target, seed }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Draw exactly `target` records for one class.
    /// Seeded resamplers use the seed directly; otherwise OS entropy.
    pub fn resample_class(&self, label: &LabelValue, records: &[Record]) -> Result<Vec<Record>, SamplerError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.draw(label, records, &mut rng)
    }

    /// Resample every class on rayon workers. Output keeps the input group order.
    ///
    /// When seeded, one master `StdRng` hands out a sub-seed per group in group
    /// order (groups are sorted by label), so output depends only on the seed,
    /// the input, and the `rand` version, never on thread scheduling or CPU.
    pub fn resample_all(&self, groups: &[ClassGroup]) -> Result<Vec<ClassGroup>, SamplerError> {
        let sub_seeds: Vec<Option<u64>> = match self.seed {
            Some(seed) => {
                let mut master = StdRng::seed_from_u64(seed);
                groups.iter().map(|_| Some(master.gen::<u64>())).collect()
            }
            None => vec![None; groups.len()],
        };

        groups
            .par_iter()
            .zip(sub_seeds)
            .map(|((label, records), sub_seed)| -> Result<ClassGroup, SamplerError> {
                let mut rng = match sub_seed {
                    Some(s) => StdRng::seed_from_u64(s),
                    None => StdRng::from_entropy(),
                };
                let drawn = self.draw(label, records, &mut rng)?;
                tracing::debug!(label = %label, available = records.len(), drawn = drawn.len(), "resampled class");
                Ok((label.clone(), drawn))
            })
            .collect()
    }

    fn draw(&self, label: &LabelValue, records: &[Record], rng: &mut StdRng) -> Result<Vec<Record>, SamplerError> {
        if self.target == 0 {
            return Ok(Vec::new());
        }
        let n = records.len();
        let too_few = match self.mode {
            Mode::Reduce => n < self.target,
            Mode::Expand => n == 0,
        };
        if too_few {
            return Err(SamplerError::SampleSize {
                label: label.to_string(),
                requested: self.target,
                available: n,
            });
        }

        let out = match self.mode {
            Mode::Reduce => rand::seq::index::sample(rng, n, self.target)
                .into_iter()
                .map(|i| records[i].clone())
                .collect(),
            Mode::Expand => (0..self.target)
                .map(|_| records[rng.gen_range(0..n)].clone())
                .collect(),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Feature;
    use std::collections::HashSet;

    fn records(n: i64) -> Vec<Record> {
        (0..n)
            .map(|i| Record::from_features([("id", Feature::Int64List(vec![i]))]))
            .collect()
    }

    fn distinct(rs: &[Record]) -> usize {
        rs.iter().map(|r| r.raw().to_string()).collect::<HashSet<_>>().len()
    }

    #[test]
    fn reduce_draws_distinct_subset() {
        let src = records(30);
        let r = Resampler::new(Mode::Reduce, 5, Some(7));
        let out = r.resample_class(&LabelValue::Int(1), &src).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(distinct(&out), 5);
        assert!(out.iter().all(|o| src.contains(o)));
    }

    #[test]
    fn reduce_at_full_size_keeps_every_record() {
        let src = records(5);
        let out = Resampler::new(Mode::Reduce, 5, None)
            .resample_class(&LabelValue::Int(1), &src)
            .unwrap();
        assert_eq!(distinct(&out), 5);
    }

    #[test]
    fn reduce_with_too_few_records_fails() {
        let err = Resampler::new(Mode::Reduce, 6, None)
            .resample_class(&LabelValue::Int(4), &records(5))
            .unwrap_err();
        match err {
            SamplerError::SampleSize { label, requested, available } => {
                assert_eq!(label, "4");
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn expand_draws_with_replacement() {
        let src = records(5);
        let out = Resampler::new(Mode::Expand, 30, None)
            .resample_class(&LabelValue::Int(3), &src)
            .unwrap();
        assert_eq!(out.len(), 30);
        assert!(distinct(&out) <= 5);
        assert!(out.iter().all(|o| src.contains(o)));
    }

    #[test]
    fn zero_target_yields_nothing() {
        let out = Resampler::new(Mode::Expand, 0, None)
            .resample_class(&LabelValue::Int(3), &records(4))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let groups = group_by_label(
            records(40)
                .into_iter()
                .enumerate()
                .map(|(i, r)| (LabelValue::Int((i % 3) as i64), r)),
        );
        let a = Resampler::new(Mode::Reduce, 10, Some(42)).resample_all(&groups).unwrap();
        let b = Resampler::new(Mode::Reduce, 10, Some(42)).resample_all(&groups).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_sub_seeds_follow_group_order() {
        let groups = vec![
            (LabelValue::Int(1), records(8)),
            (LabelValue::Int(2), records(8)),
        ];
        let all = Resampler::new(Mode::Reduce, 3, Some(9)).resample_all(&groups).unwrap();

        // The first group's draw is fixed by the first sub-seed of the master stream.
        let mut master = StdRng::seed_from_u64(9);
        let first_seed: u64 = master.gen();
        let mut rng = StdRng::seed_from_u64(first_seed);
        let expected = Resampler::new(Mode::Reduce, 3, None)
            .draw(&LabelValue::Int(1), &groups[0].1, &mut rng)
            .unwrap();
        assert_eq!(all[0].1, expected);
    }

    #[test]
    fn groups_are_sorted_by_label() {
        let groups = group_by_label(vec![
            (LabelValue::Int(9), records(1).remove(0)),
            (LabelValue::Int(2), records(1).remove(0)),
            (LabelValue::Int(9), records(1).remove(0)),
        ]);
        let labels: Vec<_> = groups.iter().map(|g| g.0.clone()).collect();
        assert_eq!(labels, vec![LabelValue::Int(2), LabelValue::Int(9)]);
        assert_eq!(groups[1].1.len(), 2);
    }
}
