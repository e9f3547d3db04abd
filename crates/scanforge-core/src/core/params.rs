// crates/scanforge-core/src/core/params.rs
// ============================================================================
// Module: ScanForge Task Parameters
// Description: The shaped value type carried by a task's parameter map.
// Purpose: Give adapters a typed view over task parameters without a full schema layer.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Task parameters are fixed-shape per tool (see each adapter's
//! documentation) but the map itself is untyped at the scheduler level —
//! the scheduler only moves `ParamMap` values around, never interprets
//! them. Adapters pull out and validate the keys they recognize.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// A single task parameter value.
///
/// # Invariants
/// - `StrList` entries are not individually re-validated by this type;
///   validation is an adapter responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A string-valued parameter.
    Str(String),
    /// An integer-valued parameter.
    Int(i64),
    /// A boolean-valued parameter.
    Bool(bool),
    /// A list of string-valued parameters.
    StrList(Vec<String>),
}

impl ParamValue {
    /// Returns the value as a string slice, if it is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a string slice list, if it is a `StrList`.
    #[must_use]
    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::StrList(value)
    }
}

/// Ordered mapping from parameter name to value.
///
/// A `BTreeMap` is used rather than a `HashMap` so serialized parameter
/// maps have a deterministic key order, which keeps persisted job
/// snapshots byte-stable across saves that do not actually change any
/// parameter.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Builds a [`ParamMap`] from `(key, value)` pairs.
#[must_use]
pub fn param_map<I, K, V>(pairs: I) -> ParamMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ParamValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn param_map_builds_from_mixed_values() {
        let map = param_map([
            ("target", ParamValue::from("127.0.0.1")),
            ("ports", ParamValue::from("top-1000")),
        ]);
        assert_eq!(map.get("target").and_then(ParamValue::as_str), Some("127.0.0.1"));
    }

    #[test]
    fn accessors_return_none_for_mismatched_variant() {
        let value = ParamValue::Int(5);
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_int(), Some(5));
    }
}
