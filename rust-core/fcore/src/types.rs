//! # Typed Values
//!
//! Conversion of raw query and path strings into typed values.
//!
//! All parsing rules live here so that every typed accessor on
//! [`Ctx`](crate::ctx::Ctx) rejects the same malformed input the same way.

use crate::error::{Error, Result};
use std::fmt;

/// Target type of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Integer type - base-prefixed, 32-bit range
    Int,
    /// Float type - parses to f64
    Float,
    /// Boolean type
    Bool,
}

impl ParamType {
    /// Get the type name for error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Converted value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String value (no conversion performed)
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl ParamValue {
    /// Get as i64 if Int variant
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if Float variant
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if Bool variant
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Convert a raw string named `key` into `param_type`
///
/// # Errors
///
/// Returns `Error::Parse` when `raw` is not a valid literal of the
/// requested type. An empty string is never valid for non-string types.
pub fn convert_param(key: &str, raw: &str, param_type: ParamType) -> Result<ParamValue> {
    let parsed = match param_type {
        ParamType::String => Some(ParamValue::String(raw.to_string())),
        ParamType::Int => parse_int(raw).map(ParamValue::Int),
        ParamType::Float => raw.parse::<f64>().ok().map(ParamValue::Float),
        ParamType::Bool => parse_bool(raw).map(ParamValue::Bool),
    };

    parsed.ok_or_else(|| Error::Parse {
        key: key.to_string(),
        value: raw.to_string(),
        expected: param_type,
    })
}

/// Boolean literals accepted by typed accessors
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Integer with optional sign and base prefix, limited to the i32 range
fn parse_int(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (radix, body) = if let Some(rest) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, rest)
    } else if let Some(rest) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, rest)
    } else if let Some(rest) = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix("0O"))
    {
        (8, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    // from_str_radix would accept a second sign
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    let magnitude = i64::from_str_radix(body, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok().map(i64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_string() {
        let result = convert_param("name", "hello", ParamType::String).unwrap();
        assert_eq!(result, ParamValue::String("hello".to_string()));
    }

    #[test]
    fn test_convert_int() {
        assert_eq!(convert_param("n", "123", ParamType::Int).unwrap(), ParamValue::Int(123));
        assert_eq!(convert_param("n", "-456", ParamType::Int).unwrap(), ParamValue::Int(-456));
        assert_eq!(convert_param("n", "0x1f", ParamType::Int).unwrap(), ParamValue::Int(31));
        assert_eq!(convert_param("n", "0b101", ParamType::Int).unwrap(), ParamValue::Int(5));
        assert_eq!(convert_param("n", "017", ParamType::Int).unwrap(), ParamValue::Int(15));
        assert_eq!(convert_param("n", "0", ParamType::Int).unwrap(), ParamValue::Int(0));
    }

    #[test]
    fn test_convert_int_invalid() {
        assert!(convert_param("n", "abc", ParamType::Int).is_err());
        assert!(convert_param("n", "", ParamType::Int).is_err());
        assert!(convert_param("n", "--1", ParamType::Int).is_err());
        assert!(convert_param("n", "09", ParamType::Int).is_err());
        // outside the 32-bit range
        assert!(convert_param("n", "2147483648", ParamType::Int).is_err());
        assert_eq!(
            convert_param("n", "-2147483648", ParamType::Int).unwrap(),
            ParamValue::Int(-2_147_483_648)
        );
    }

    #[test]
    fn test_convert_float() {
        let result = convert_param("price", "3.5", ParamType::Float).unwrap();
        assert_eq!(result.as_float(), Some(3.5));
        assert!(convert_param("price", "3.5.1", ParamType::Float).is_err());
    }

    #[test]
    fn test_convert_bool() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(convert_param("b", raw, ParamType::Bool).unwrap().as_bool(), Some(true));
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(convert_param("b", raw, ParamType::Bool).unwrap().as_bool(), Some(false));
        }
        assert!(convert_param("b", "yes", ParamType::Bool).is_err());
        assert!(convert_param("b", "", ParamType::Bool).is_err());
    }

    #[test]
    fn test_parse_error_carries_key() {
        let err = convert_param("limit", "ten", ParamType::Int).unwrap_err();
        match err {
            Error::Parse { key, value, expected } => {
                assert_eq!(key, "limit");
                assert_eq!(value, "ten");
                assert_eq!(expected, ParamType::Int);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
