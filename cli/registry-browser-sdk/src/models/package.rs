use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::providers::registry::RawPackage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("package record has no name")]
pub struct MissingLabel;

/// A package as listed by the registry.
///
/// The `label` is the package name.
/// All other fields of the listing are kept as-is in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(rename = "name")]
    label: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl PackageRecord {
    pub fn new(label: impl Into<String>, fields: Map<String, Value>) -> Result<Self, MissingLabel> {
        let label = label.into();
        if label.is_empty() {
            return Err(MissingLabel);
        }
        Ok(Self { label, fields })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn version(&self) -> Option<&str> {
        self.field("version").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.field("description").and_then(Value::as_str)
    }

    /// String entries of the `keywords` array, non-string entries are skipped.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.field("keywords")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<RawPackage> for PackageRecord {
    type Error = MissingLabel;

    fn try_from(raw: RawPackage) -> Result<Self, Self::Error> {
        let label = raw.name.ok_or(MissingLabel)?;
        Self::new(label, raw.fields)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawPackage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn record_from_listing() {
        let record = PackageRecord::try_from(raw(json!({
            "name": "react",
            "version": "18.2.0",
            "description": "UI library",
            "keywords": ["ui", 42, "view"],
            "author": { "name": "Meta" },
        })))
        .unwrap();

        assert_eq!(record.label(), "react");
        assert_eq!(record.version(), Some("18.2.0"));
        assert_eq!(record.description(), Some("UI library"));
        assert_eq!(record.keywords().collect::<Vec<_>>(), vec!["ui", "view"]);
        assert_eq!(record.field("author"), Some(&json!({ "name": "Meta" })));
        assert!(!record.fields().contains_key("name"));
    }

    #[test]
    fn record_without_optional_fields() {
        let record = PackageRecord::try_from(raw(json!({ "name": "left-pad" }))).unwrap();

        assert_eq!(record.version(), None);
        assert_eq!(record.description(), None);
        assert_eq!(record.keywords().count(), 0);
    }

    #[test]
    fn record_requires_a_name() {
        assert_eq!(
            PackageRecord::try_from(raw(json!({ "version": "1.0.0" }))),
            Err(MissingLabel)
        );
        assert_eq!(
            PackageRecord::try_from(raw(json!({ "name": "" }))),
            Err(MissingLabel)
        );
    }

    #[test]
    fn record_serializes_label_as_name() {
        let record = PackageRecord::new("redux", Map::new()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({ "name": "redux" }));
    }
}
