//! Record data model: an opaque serialized payload plus its decoded feature map.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One named field of a record. Mirrors the two list kinds a label can live in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Int64List(Vec<i64>),
    BytesList(Vec<String>),
}

/// Line-level schema. Unknown top-level keys are ignored by serde but kept in `raw`.
#[derive(Deserialize)]
struct RecordLine {
    features: BTreeMap<String, Feature>,
}

/// Immutable record. Cloning is cheap (shared payload), which keeps
/// oversampled duplicates from copying the underlying bytes.
#[derive(Clone, Debug)]
pub struct Record {
    raw: Arc<str>,
    features: Arc<BTreeMap<String, Feature>>,
}

impl Record {
    /// Decode one JSON line. The line itself becomes the record's payload.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let parsed: RecordLine = serde_json::from_str(line)?;
        Ok(Self {
            raw: Arc::from(line),
            features: Arc::new(parsed.features),
        })
    }

    /// Build a record from features; the payload is the canonical JSON encoding.
    pub fn from_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = (S, Feature)>,
        S: Into<String>,
    {
        let features: BTreeMap<String, Feature> =
            features.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let raw = json!({ "features": &features }).to_string();
        Self {
            raw: Arc::from(raw),
            features: Arc::new(features),
        }
    }

    /// Serialized payload, written back verbatim by the sink.
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }

    pub fn features(&self) -> &BTreeMap<String, Feature> {
        &self.features
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Record {}
