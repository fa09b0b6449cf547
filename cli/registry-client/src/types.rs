//! Wire types of the registry web API.

use serde::{Deserialize, Serialize};

/// A package as listed by the `packages` resource.
///
/// Only `name` is interpreted, every other field is carried verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_package_keeps_unknown_fields() {
        let raw: RawPackage = serde_json::from_value(json!({
            "name": "react",
            "version": "18.0.0",
            "keywords": ["ui"],
            "author": { "name": "Meta" },
        }))
        .unwrap();

        assert_eq!(raw.name.as_deref(), Some("react"));
        assert_eq!(raw.fields["version"], json!("18.0.0"));
        assert_eq!(raw.fields["keywords"], json!(["ui"]));
        assert_eq!(raw.fields["author"], json!({ "name": "Meta" }));
        assert!(!raw.fields.contains_key("name"));
    }

    #[test]
    fn raw_package_without_name() {
        let raw: RawPackage = serde_json::from_value(json!({ "version": "1.0.0" })).unwrap();
        assert_eq!(raw.name, None);
    }
}
