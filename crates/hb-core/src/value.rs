//! Values written into model input files.

use std::fmt;

/// A scalar written into a table cell or substituted into a template.
///
/// The rendered text is what lands on disk, so `Display` is the contract.
/// Floats use the shortest text that reads back to the same value and always
/// keep a decimal point or exponent (`1.0`, `0.555`, `1e-7`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl ParamValue {
    /// Interpret command-line text: integer, then float, then plain text.
    pub fn parse_literal(text: &str) -> Self {
        let text = text.trim();
        if let Ok(value) = text.parse::<i64>() {
            Self::Int(value)
        } else if let Ok(value) = text.parse::<f64>() {
            Self::Float(value)
        } else {
            Self::Text(text.to_string())
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
