use crate::record::Record;
use crate::resample::ClassGroup;

/// Concatenate resampled classes with both passthrough buckets.
/// Passthrough records appear exactly once each; no ordering across sources is implied.
pub fn merge_outputs(resampled: Vec<ClassGroup>, null: Vec<Record>, exempt: Vec<Record>) -> Vec<Record> {
    let sampled_len: usize = resampled.iter().map(|(_, rs)| rs.len()).sum();
    let mut out = Vec::with_capacity(sampled_len + null.len() + exempt.len());
    for (_, records) in resampled {
        out.extend(records);
    }
    out.extend(null);
    out.extend(exempt);
    out
}
