//! Case-insensitive parameter maps.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ConnectorError;

/// A JSON parameter map whose keys compare case-insensitively.
///
/// Keys are stored lowercased; lookups lowercase their argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing one under the same key.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) {
        self.values
            .insert(key.as_ref().to_lowercase(), value.into());
    }

    /// Builder-style [`Parameters::insert`].
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&key.to_lowercase())
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String value for `key`, or `None` when absent or `null`.
    ///
    /// # Errors
    /// [`ConnectorError::Validation`] when the value is not a string.
    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, ConnectorError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ConnectorError::validation(format!(
                "parameter '{key}' must be a string, got {}",
                kind(other)
            ))),
        }
    }

    /// Non-empty string value for `key`.
    ///
    /// # Errors
    /// [`ConnectorError::Validation`] when missing, empty, or not a string.
    pub fn required_str(&self, key: &str) -> Result<&str, ConnectorError> {
        match self.optional_str(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(ConnectorError::validation(format!(
                "parameter '{key}' is required"
            ))),
        }
    }

    /// Boolean flag for `key`, `false` when absent.
    ///
    /// Accepts JSON booleans and the strings `"true"`/`"false"` in any case.
    ///
    /// # Errors
    /// [`ConnectorError::Validation`] for any other value.
    pub fn optional_bool(&self, key: &str) -> Result<bool, ConnectorError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") || s.is_empty() => Ok(false),
            Some(other) => Err(ConnectorError::validation(format!(
                "parameter '{key}' must be a boolean, got {other}"
            ))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Value>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn keys_are_case_insensitive() {
        let params = Parameters::new().with("ServerName", "ftp.example.com");
        assert_eq!(params.required_str("servername").unwrap(), "ftp.example.com");
        assert_eq!(params.required_str("SERVERNAME").unwrap(), "ftp.example.com");
    }

    #[test]
    fn deserialize_lowercases_keys() {
        let params: Parameters =
            serde_json::from_value(json!({"UserName": "bob", "UseSSL": true})).unwrap();
        assert_eq!(params.required_str("username").unwrap(), "bob");
        assert!(params.optional_bool("usessl").unwrap());
    }

    #[rstest]
    #[case(json!({}), "missing")]
    #[case(json!({"k": ""}), "empty")]
    #[case(json!({"k": null}), "null")]
    fn required_str_rejects(#[case] input: Value, #[case] label: &str) {
        let params: Parameters = serde_json::from_value(input).unwrap();
        let err = params.required_str("k").unwrap_err();
        assert!(
            matches!(err, ConnectorError::Validation(_)),
            "{label}: {err:?}"
        );
    }

    #[test]
    fn required_str_rejects_non_strings() {
        let params = Parameters::new().with("k", 5);
        let err = params.required_str("k").unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!(false), false)]
    #[case(json!("TRUE"), true)]
    #[case(json!("false"), false)]
    #[case(json!(null), false)]
    fn optional_bool_accepts(#[case] value: Value, #[case] expected: bool) {
        let params = Parameters::new().with("flag", value);
        assert_eq!(params.optional_bool("flag").unwrap(), expected);
    }

    #[test]
    fn optional_bool_defaults_to_false() {
        assert!(!Parameters::new().optional_bool("flag").unwrap());
    }

    #[test]
    fn optional_bool_rejects_garbage() {
        let params = Parameters::new().with("flag", "yes");
        assert!(params.optional_bool("flag").is_err());
    }
}
