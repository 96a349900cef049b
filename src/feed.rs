use serde::Deserialize;
use serde_json::{Map, Value};

/// Parsed NeoWs feed body. Date keys and per-date object lists keep the
/// order they have in the source document.
///
/// Object records stay as loose JSON so that one malformed object cannot fail
/// the decode of the whole week.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedResponse {
    /// Informational only, kept loose like the object records.
    #[serde(default)]
    pub element_count: Option<Value>,
    #[serde(default)]
    pub near_earth_objects: Map<String, Value>,
}

impl FeedResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Iterate `(date, objects)` in source order. Non-array entries yield no objects.
    pub fn days(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.near_earth_objects.iter().map(|(date, objects)| {
            let objects = objects.as_array().map(Vec::as_slice).unwrap_or(&[]);
            (date.as_str(), objects)
        })
    }
}
