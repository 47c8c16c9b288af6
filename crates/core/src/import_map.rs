//! Import map configuration.
//!
//! Only the `imports` table of the import-map format is used, and only for exact specifier
//! lookups. Anything else in the document is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `{ "imports": { "<specifier>": "<replacement>", ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    pub imports: IndexMap<String, String>,
}

impl ImportMap {
    pub fn new<K, V>(imports: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            imports: imports
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse an import map document leniently.
    ///
    /// Malformed JSON, a missing `imports` key, or a non-object `imports` value all yield an empty
    /// map; entries whose value is not a string are skipped.
    pub fn from_json(json: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed import map");
                return Self::default();
            }
        };

        let imports = value
            .get("imports")
            .and_then(serde_json::Value::as_object)
            .map(|table| {
                table
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self { imports }
    }

    /// Replacement for `specifier`, if mapped.
    pub fn resolve(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_reads_imports() {
        let map = ImportMap::from_json(r#"{"imports":{"lit":"other-lit-url","lit2":"x"}}"#);
        assert_eq!(map.resolve("lit"), Some("other-lit-url"));
        assert_eq!(map.resolve("lit2"), Some("x"));
        assert_eq!(map.resolve("missing"), None);
    }

    #[test]
    fn from_json_is_lenient() {
        assert!(ImportMap::from_json("not json").is_empty());
        assert!(ImportMap::from_json("{}").is_empty());
        assert!(ImportMap::from_json(r#"{"imports":[1,2]}"#).is_empty());

        let map = ImportMap::from_json(r#"{"imports":{"a":1,"b":"bee"},"scopes":{}}"#);
        assert_eq!(map.resolve("a"), None);
        assert_eq!(map.resolve("b"), Some("bee"));
    }

    #[test]
    fn deserializes_with_serde() {
        let map: ImportMap = serde_json::from_str(r#"{"imports":{"lit":"url"}}"#).unwrap();
        assert_eq!(map, ImportMap::new([("lit", "url")]));

        let empty: ImportMap = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
