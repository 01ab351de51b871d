//! Loosely typed parameter values carried by node specs and workflow steps.
//!
//! YAML documents put whatever the author wrote into these maps: numbers,
//! strings (sometimes numbers written as strings, e.g. `"1e-6"`), booleans
//! and lists. Consumers read them through [`ParamsExt`], which performs the
//! numeric coercions once and reports type mismatches by key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExperimentError, ExperimentResult};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Any numeric value; integers are widened to `f64`.
    Number(f64),
    /// Free-form text.
    Text(String),
    /// Ordered list of values.
    List(Vec<ParamValue>),
}

/// Parameter map keyed by name.
pub type Params = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// Numeric view of the value.
    ///
    /// Text that parses as a float is accepted, so `"8e7"` and `8e7`
    /// read the same.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of the value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List view of the value.
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short type name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "string",
            ParamValue::List(_) => "list",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "{s}"),
            ParamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(v: Vec<ParamValue>) -> Self {
        ParamValue::List(v)
    }
}

/// Typed lookups on a [`Params`] map.
///
/// Each getter returns `Ok(None)` when the key is absent and an
/// [`ExperimentError::InvalidParameter`] when it is present with the wrong
/// type.
pub trait ParamsExt {
    /// Read a numeric parameter.
    fn get_f64(&self, key: &str) -> ExperimentResult<Option<f64>>;

    /// Read a text parameter.
    fn get_str(&self, key: &str) -> ExperimentResult<Option<&str>>;

    /// Read a boolean parameter.
    fn get_bool(&self, key: &str) -> ExperimentResult<Option<bool>>;

    /// Read a list of numbers.
    fn get_f64_list(&self, key: &str) -> ExperimentResult<Option<Vec<f64>>>;

    /// Read a numeric parameter that must be present.
    fn require_f64(&self, key: &str) -> ExperimentResult<f64>;
}

fn invalid(key: &str, expected: &str, found: &ParamValue) -> ExperimentError {
    ExperimentError::InvalidParameter {
        name: key.to_string(),
        reason: format!("expected {expected}, found {} '{found}'", found.kind()),
    }
}

impl ParamsExt for Params {
    fn get_f64(&self, key: &str) -> ExperimentResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| invalid(key, "number", v)),
        }
    }

    fn get_str(&self, key: &str) -> ExperimentResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| invalid(key, "string", v)),
        }
    }

    fn get_bool(&self, key: &str) -> ExperimentResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| invalid(key, "bool", v)),
        }
    }

    fn get_f64_list(&self, key: &str) -> ExperimentResult<Option<Vec<f64>>> {
        let Some(v) = self.get(key) else {
            return Ok(None);
        };
        let items = v.as_list().ok_or_else(|| invalid(key, "list", v))?;
        items
            .iter()
            .map(|item| item.as_f64().ok_or_else(|| invalid(key, "list of numbers", v)))
            .collect::<ExperimentResult<Vec<_>>>()
            .map(Some)
    }

    fn require_f64(&self, key: &str) -> ExperimentResult<f64> {
        self.get_f64(key)?
            .ok_or_else(|| ExperimentError::InvalidParameter {
                name: key.to_string(),
                reason: "required parameter is missing".into(),
            })
    }
}

/// Convert string values that parse as floats into numbers.
///
/// Handles `"1e-6"`, `"8e7"`, `"10e6"` and similar. Strings that do not
/// parse are kept verbatim, and non-string values pass through unchanged.
pub fn coerce_numeric_strings(params: &Params) -> Params {
    params
        .iter()
        .map(|(k, v)| {
            let value = match v {
                ParamValue::Text(s) => match s.trim().parse::<f64>() {
                    Ok(num) => ParamValue::Number(num),
                    Err(_) => v.clone(),
                },
                other => other.clone(),
            };
            (k.clone(), value)
        })
        .collect()
}
