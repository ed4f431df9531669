//! # Canonical Parameter Encoding
//!
//! Both directions of authentication hash the same thing: a request's (or a
//! callback's) named fields rendered as
//!
//! ```text
//! name1=value1&name2=value2&...&nameN=valueN
//! ```
//!
//! with entries sorted by field name, compared byte-wise. No URL escaping,
//! no trailing separator. The outbound signer appends the shared secret to
//! this string; the callback verifier hashes it as-is.
//!
//! [`ParameterMap`] is backed by a `BTreeMap<String, _>`, so iteration order
//! is already byte-wise ascending and independent of insertion order. That
//! is the whole determinism argument.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while turning a field into canonical text.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The value has a shape the canonical form cannot express (null,
    /// array, object, or a non-integer number).
    #[error("field `{field}` has unsupported value type: {kind}")]
    UnsupportedValue { field: String, kind: &'static str },

    /// The business payload could not be serialized to JSON text.
    #[error("biz_content serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A scalar parameter value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    /// Rendered in plain decimal, no grouping, no locale.
    Int(i64),
    /// Rendered as `true` / `false`.
    Bool(bool),
    /// Already-serialized JSON text (e.g. `biz_content`). Included verbatim,
    /// never re-escaped.
    JsonText(String),
}

impl ParamValue {
    /// The text this value contributes to the canonical string.
    pub fn canonical_text(&self) -> Cow<'_, str> {
        match self {
            ParamValue::Text(s) | ParamValue::JsonText(s) => Cow::Borrowed(s),
            ParamValue::Int(n) => Cow::Owned(n.to_string()),
            ParamValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }

    /// Convert a loosely typed JSON value. Only scalars that have a stable
    /// text form are accepted.
    pub fn from_json(field: &str, value: &Value) -> Result<Self, EncodingError> {
        let unsupported = |kind| EncodingError::UnsupportedValue {
            field: field.to_string(),
            kind,
        };
        match value {
            Value::String(s) => Ok(ParamValue::Text(s.clone())),
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| unsupported("non-integer number")),
            Value::Null => Err(unsupported("null")),
            Value::Array(_) => Err(unsupported("array")),
            Value::Object(_) => Err(unsupported("object")),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) | ParamValue::JsonText(s) => Value::String(s.clone()),
            ParamValue::Int(n) => Value::from(*n),
            ParamValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        ParamValue::Text(s.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Parameter map
// ---------------------------------------------------------------------------

/// Field name → scalar value. A name appears at most once; inserting an
/// existing name replaces its value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: BTreeMap<String, ParamValue>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Insert a loosely typed JSON value, rejecting shapes without a stable
    /// text form.
    pub fn insert_json(&mut self, name: &str, value: &Value) -> Result<(), EncodingError> {
        let converted = ParamValue::from_json(name, value)?;
        self.entries.insert(name.to_string(), converted);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// The canonical text of a field, or `""` when absent.
    pub fn get_text(&self, name: &str) -> Cow<'_, str> {
        self.entries
            .get(name)
            .map(ParamValue::canonical_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (byte-wise ascending) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A JSON object with the same entries. Integers and booleans stay
    /// typed; everything else becomes a string.
    pub fn to_json_object(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterMap
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Canonical string
// ---------------------------------------------------------------------------

/// The byte string that gets hashed. See the module docs for the format.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalString(String);

impl CanonicalString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Append the shared secret. Only the outbound signer does this.
    pub fn with_secret(&self, secret: &str) -> String {
        let mut salted = String::with_capacity(self.0.len() + secret.len());
        salted.push_str(&self.0);
        salted.push_str(secret);
        salted
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a parameter map into its canonical string.
///
/// Entries are sorted by raw field name, joined as `name=value` with `&`.
/// An empty map yields an empty string.
pub fn encode(fields: &ParameterMap) -> CanonicalString {
    let mut out = String::new();
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(name);
        out.push('=');
        out.push_str(&value.canonical_text());
    }
    CanonicalString(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_map_encodes_to_empty_string() {
        assert_eq!(encode(&ParameterMap::new()).as_str(), "");
    }

    #[test]
    fn test_entries_sorted_by_name() {
        let mut m = ParameterMap::new();
        m.insert("timestamp", "1700000000");
        m.insert("app_id", "800000");
        m.insert("method", "tp.trade.query");
        assert_eq!(
            encode(&m).as_str(),
            "app_id=800000&method=tp.trade.query&timestamp=1700000000"
        );
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let pairs = [("b", "2"), ("a", "1"), ("c", "3"), ("_z", "0")];
        let forward: ParameterMap = pairs.iter().copied().collect();
        let backward: ParameterMap = pairs.iter().rev().copied().collect();
        assert_eq!(encode(&forward), encode(&backward));
    }

    #[test]
    fn test_sort_is_bytewise_not_locale() {
        // Uppercase sorts before lowercase, underscore between them.
        let m: ParameterMap = [("b", "1"), ("B", "2"), ("_", "3")].into_iter().collect();
        assert_eq!(encode(&m).as_str(), "B=2&_=3&b=1");
    }

    #[test]
    fn test_integers_and_booleans_are_plain_decimal() {
        let mut m = ParameterMap::new();
        m.insert("total_amount", 1_000_000i64);
        m.insert("negative", -5i64);
        m.insert("flag", true);
        assert_eq!(
            encode(&m).as_str(),
            "flag=true&negative=-5&total_amount=1000000"
        );
    }

    #[test]
    fn test_json_text_is_included_verbatim() {
        let mut m = ParameterMap::new();
        m.insert("biz_content", ParamValue::JsonText(r#"{"a":"x&y","b":1}"#.into()));
        assert_eq!(encode(&m).as_str(), r#"biz_content={"a":"x&y","b":1}"#);
    }

    #[test]
    fn test_duplicate_name_replaces_value() {
        let mut m = ParameterMap::new();
        m.insert("k", "old");
        m.insert("k", "new");
        assert_eq!(m.len(), 1);
        assert_eq!(encode(&m).as_str(), "k=new");
    }

    #[test]
    fn test_insert_json_accepts_scalars() {
        let mut m = ParameterMap::new();
        m.insert_json("s", &json!("text")).unwrap();
        m.insert_json("n", &json!(42)).unwrap();
        m.insert_json("b", &json!(false)).unwrap();
        assert_eq!(encode(&m).as_str(), "b=false&n=42&s=text");
    }

    #[test]
    fn test_insert_json_rejects_unsupported_shapes() {
        let mut m = ParameterMap::new();
        for (name, value) in [
            ("null", json!(null)),
            ("arr", json!([1, 2])),
            ("obj", json!({"a": 1})),
            ("float", json!(1.5)),
        ] {
            let err = m.insert_json(name, &value).unwrap_err();
            assert!(err.to_string().contains(name));
        }
        assert!(m.is_empty());
    }

    #[test]
    fn test_with_secret_appends_without_separator() {
        let m: ParameterMap = [("a", "1")].into_iter().collect();
        assert_eq!(encode(&m).with_secret("SALT"), "a=1SALT");
    }

    #[test]
    fn test_to_json_object_keeps_types() {
        let mut m = ParameterMap::new();
        m.insert("amount", 7i64);
        m.insert("name", "x");
        let obj = m.to_json_object();
        assert_eq!(obj["amount"], json!(7));
        assert_eq!(obj["name"], json!("x"));
    }
}
