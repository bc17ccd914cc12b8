//! Cache Key Module
//!
//! Derives canonical cache keys from a request target and its query parameters.
//!
//! Key layout: `<escaped target>?<name>=<value>&<name>=<value>...` with names in
//! lexicographic order. The target escapes `%` and `?`, names and values are
//! percent-encoded, so the first raw `?` always separates target from query and
//! no two distinct inputs share a key.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{CacheError, Result};

/// Separator between the target and the canonical query text.
pub const KEY_SEPARATOR: char = '?';

// == Param Value ==
/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
}

impl ParamValue {
    /// Returns true if the value has an unambiguous text form.
    pub fn is_encodable(&self) -> bool {
        match self {
            ParamValue::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Unsigned(n) => write!(f, "{}", n),
            ParamValue::Float(n) => write!(f, "{}", n),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Unsigned(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Unsigned(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Boolean(value)
    }
}

impl TryFrom<Value> for ParamValue {
    type Error = CacheError;

    /// Converts a JSON scalar. Null, arrays and objects are rejected.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ParamValue::Text(s)),
            Value::Bool(b) => Ok(ParamValue::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(ParamValue::Unsigned(u))
                } else {
                    n.as_f64().map(ParamValue::Float).ok_or_else(|| {
                        CacheError::InvalidKeyInput(format!("unrepresentable number {}", n))
                    })
                }
            }
            other => Err(CacheError::InvalidKeyInput(format!(
                "parameter value must be a scalar, got {}",
                other
            ))),
        }
    }
}

/// Converts a JSON object into a parameter list.
pub fn params_from_json(value: Value) -> Result<Vec<(String, ParamValue)>> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| ParamValue::try_from(value).map(|value| (name, value)))
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(CacheError::InvalidKeyInput(format!(
            "parameters must be a JSON object, got {}",
            other
        ))),
    }
}

// == Cache Key ==
/// Canonical identifier for a request shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    // == Derive ==
    /// Builds the key for `target` with `params`.
    ///
    /// Parameters are sorted by name; a repeated name keeps its last value.
    ///
    /// # Errors
    /// `InvalidKeyInput` if the target is empty or a value is a non-finite float.
    pub fn derive<I, K, V>(target: &str, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        if target.is_empty() {
            return Err(CacheError::InvalidKeyInput(
                "target must not be empty".to_string(),
            ));
        }

        let sorted: BTreeMap<String, ParamValue> = params
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();

        let mut key = escape_target(target);
        key.push(KEY_SEPARATOR);

        for (index, (name, value)) in sorted.iter().enumerate() {
            if !value.is_encodable() {
                return Err(CacheError::InvalidKeyInput(format!(
                    "parameter '{}' has non-finite value {}",
                    name, value
                )));
            }
            if index > 0 {
                key.push('&');
            }
            key.push_str(&urlencoding::encode(name));
            key.push('=');
            key.push_str(&urlencoding::encode(&value.to_string()));
        }

        Ok(Self(key))
    }

    /// Returns the canonical key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    /// Wraps text that is already in canonical form.
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes a target the way it appears in key text.
pub(crate) fn escape_target(target: &str) -> String {
    target.replace('%', "%25").replace(KEY_SEPARATOR, "%3F")
}
