//! Per-class counting over the countable bucket, with a merge helper for parallel partials.

use crate::label::LabelValue;
use crate::record::Record;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Number of countable records per distinct label.
pub type ClassCount = BTreeMap<LabelValue, u64>;

/// Full-pass count. Partial maps are built on rayon workers and merged.
pub fn count_per_label(countable: &[(LabelValue, Record)]) -> ClassCount {
    countable
        .par_iter()
        .fold(ClassCount::new, |mut m, (label, _)| {
            *m.entry(label.clone()).or_insert(0) += 1;
            m
        })
        .reduce(ClassCount::new, |mut total, part| {
            merge_counts(&mut total, part);
            total
        })
}

pub fn merge_counts(total: &mut ClassCount, part: ClassCount) {
    for (k, v) in part {
        *total.entry(k).or_insert(0) += v;
    }
}
