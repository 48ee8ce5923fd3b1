//! Record and diagnostic types exchanged between the cipher and its host.
//!
//! Records are serialised as JSON objects, one per line, on the driver's
//! stdin and stdout. Field order is preserved end to end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CryptError;

/// Leading character of internal metadata fields (e.g. `_time`, `_raw`).
///
/// Fields whose name starts with this marker are never transformed.
pub const INTERNAL_FIELD_MARKER: char = '_';

// ---------------------------------------------------------------------------
// Operation mode
// ---------------------------------------------------------------------------

/// Direction of the field transform, fixed for a whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Encrypt,
    Decrypt,
}

impl FromStr for OperationMode {
    type Err = CryptError;

    /// Accepts `e` / `encrypt` and `d` / `decrypt`, ignoring case and
    /// surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e" | "encrypt" => Ok(OperationMode::Encrypt),
            "d" | "decrypt" => Ok(OperationMode::Decrypt),
            _ => Err(CryptError::InvalidMode(s.to_owned())),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Encrypt => f.write_str("encryption"),
            OperationMode::Decrypt => f.write_str("decryption"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One structured event: an ordered mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Look up a field value by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field value. An existing field keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, value)` pairs in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Returns `true` if `field` names internal metadata that must pass through untouched.
pub fn is_internal_field(field: &str) -> bool {
    field.starts_with(INTERNAL_FIELD_MARKER)
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Non-fatal diagnostic: a selected field that could not be transformed and
/// was emitted with its original value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    /// Name of the field that failed.
    pub field: String,
    /// The untouched value that was emitted in its place.
    pub original: String,
    /// Human-readable failure cause.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mode_parses_short_and_long_forms() {
        assert_eq!("e".parse::<OperationMode>().unwrap(), OperationMode::Encrypt);
        assert_eq!("Encrypt".parse::<OperationMode>().unwrap(), OperationMode::Encrypt);
        assert_eq!(" d ".parse::<OperationMode>().unwrap(), OperationMode::Decrypt);
        assert_eq!("decrypt".parse::<OperationMode>().unwrap(), OperationMode::Decrypt);
    }

    #[test]
    fn mode_rejects_unknown_value() {
        let err = "x".parse::<OperationMode>().unwrap_err();
        assert!(matches!(err, CryptError::InvalidMode(ref m) if m == "x"));
        assert!("encrypted".parse::<OperationMode>().is_err());
        assert!("".parse::<OperationMode>().is_err());
    }

    #[test]
    fn record_preserves_field_order() {
        let json = r#"{"zeta":"1","alpha":"2","_time":"3"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "_time"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }

    #[test]
    fn insert_keeps_position_of_existing_field() {
        let mut record: Record = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        record.insert("b", "changed");
        let names: Vec<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(record.get("b"), Some(&json!("changed")));
    }

    #[test]
    fn internal_marker() {
        assert!(is_internal_field("_raw"));
        assert!(!is_internal_field("user_name"));
    }
}
