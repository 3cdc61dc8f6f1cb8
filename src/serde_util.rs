//! Field-level deserialization helpers for upstream JSON.
//!
//! The dashboard API is loose about nullability and about whether
//! identifiers are strings or integers. These helpers absorb both.

use serde::{Deserialize, Deserializer};

/// Deserialize `null` (or an absent field, with `#[serde(default)]`) as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept either a JSON string or a JSON integer and keep it as a string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "null_as_default")]
        count: u64,
    }

    #[test]
    fn test_numeric_id_becomes_string() {
        let row: Row = serde_json::from_str(r#"{"id": 42, "count": 3}"#).unwrap();
        assert_eq!(row.id, "42");
        assert_eq!(row.count, 3);
    }

    #[test]
    fn test_null_count_defaults() {
        let row: Row = serde_json::from_str(r#"{"id": "r-7", "count": null}"#).unwrap();
        assert_eq!(row.id, "r-7");
        assert_eq!(row.count, 0);
    }

    #[test]
    fn test_missing_count_defaults() {
        let row: Row = serde_json::from_str(r#"{"id": "r-8"}"#).unwrap();
        assert_eq!(row.count, 0);
    }
}
