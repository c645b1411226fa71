use crate::record::{Feature, Record};
use std::fmt;

/// Value of the label field of one record.
///
/// `Absent` is its own state: a record whose label is `Int(0)` or `Str("")`
/// still has a label.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelValue {
    Absent,
    Int(i64),
    Str(String),
}

impl LabelValue {
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, LabelValue::Absent)
    }
}

/// String form used for exempt-set membership: integers in decimal, strings as-is.
impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelValue::Absent => f.write_str("None"),
            LabelValue::Int(v) => write!(f, "{v}"),
            LabelValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for LabelValue {
    fn from(v: i64) -> Self {
        LabelValue::Int(v)
    }
}

impl From<&str> for LabelValue {
    fn from(s: &str) -> Self {
        LabelValue::Str(s.to_string())
    }
}

/// Pulls the label out of a record's configured field.
///
/// The first element of a non-empty int list wins; otherwise the first element
/// of a non-empty bytes list; otherwise the label is absent. A missing field is
/// not an error.
#[derive(Clone, Debug)]
pub struct LabelExtractor {
    field: String,
}

impl LabelExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn extract(&self, record: &Record) -> LabelValue {
        match record.feature(&self.field) {
            Some(Feature::Int64List(v)) => v.first().map_or(LabelValue::Absent, |x| LabelValue::Int(*x)),
            Some(Feature::BytesList(v)) => v.first().map_or(LabelValue::Absent, |s| LabelValue::Str(s.clone())),
            None => LabelValue::Absent,
        }
    }

    /// Extract and pair, producing one labeled record.
    pub fn label(&self, record: Record) -> (LabelValue, Record) {
        (self.extract(&record), record)
    }
}
