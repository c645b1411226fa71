//! Routing of labeled records into the null, exempt, and countable buckets.

use crate::label::LabelValue;
use crate::record::Record;
use ahash::AHashSet;

/// Label values (string form) that are never resampled.
#[derive(Clone, Debug, Default)]
pub struct ExemptSet {
    keys: AHashSet<String>,
}

impl ExemptSet {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { keys: keys.into_iter().map(Into::into).collect() }
    }

    #[inline]
    pub fn contains(&self, label: &LabelValue) -> bool {
        !self.keys.is_empty() && self.keys.contains(label.to_string().as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Where a labeled record goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Null,
    Exempt,
    Countable,
}

/// Absence is checked first, so an absent label is `Null` even if "None" is exempt.
#[inline]
pub fn classify(label: &LabelValue, exempt: &ExemptSet) -> Bucket {
    if label.is_absent() {
        Bucket::Null
    } else if exempt.contains(label) {
        Bucket::Exempt
    } else {
        Bucket::Countable
    }
}

/// The three buckets after one pass over the labeled stream.
#[derive(Debug, Default)]
pub struct Partitioned {
    pub null: Vec<Record>,
    pub exempt: Vec<Record>,
    pub countable: Vec<(LabelValue, Record)>,
}

impl Partitioned {
    pub fn push(&mut self, label: LabelValue, record: Record, exempt: &ExemptSet) {
        match classify(&label, exempt) {
            Bucket::Null => self.null.push(record),
            Bucket::Exempt => self.exempt.push(record),
            Bucket::Countable => self.countable.push((label, record)),
        }
    }

    /// Combine two partial partitions (used when partitioning in parallel).
    pub fn merge(mut self, other: Self) -> Self {
        self.null.extend(other.null);
        self.exempt.extend(other.exempt);
        self.countable.extend(other.countable);
        self
    }

    pub fn total(&self) -> usize {
        self.null.len() + self.exempt.len() + self.countable.len()
    }
}

pub fn partition<I>(labeled: I, exempt: &ExemptSet) -> Partitioned
where
    I: IntoIterator<Item = (LabelValue, Record)>,
{
    let mut out = Partitioned::default();
    for (label, record) in labeled {
        out.push(label, record, exempt);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Feature;

    #[test]
    fn truth_table() {
        let exempt = ExemptSet::new(["2", "dog"]);
        assert_eq!(classify(&LabelValue::Absent, &exempt), Bucket::Null);
        assert_eq!(classify(&LabelValue::Int(2), &exempt), Bucket::Exempt);
        assert_eq!(classify(&LabelValue::Str("2".into()), &exempt), Bucket::Exempt);
        assert_eq!(classify(&LabelValue::Str("dog".into()), &exempt), Bucket::Exempt);
        assert_eq!(classify(&LabelValue::Int(1), &exempt), Bucket::Countable);
        assert_eq!(classify(&LabelValue::Str("cat".into()), &exempt), Bucket::Countable);
    }

    #[test]
    fn zero_is_countable_not_null() {
        let exempt = ExemptSet::default();
        assert_eq!(classify(&LabelValue::Int(0), &exempt), Bucket::Countable);
    }

    #[test]
    fn absent_stays_null_even_when_none_is_exempt() {
        let exempt = ExemptSet::new(["None"]);
        assert_eq!(classify(&LabelValue::Absent, &exempt), Bucket::Null);
    }

    #[test]
    fn partition_routes_each_record_once() {
        let r = |i: i64| Record::from_features([("id", Feature::Int64List(vec![i]))]);
        let labeled = vec![
            (LabelValue::Absent, r(0)),
            (LabelValue::Int(5), r(1)),
            (LabelValue::Int(6), r(2)),
            (LabelValue::Int(6), r(3)),
        ];
        let p = partition(labeled, &ExemptSet::new(["5"]));
        assert_eq!(p.null.len(), 1);
        assert_eq!(p.exempt.len(), 1);
        assert_eq!(p.countable.len(), 2);
        assert_eq!(p.total(), 4);
    }
}
