//! # JSON Serialization Module
//!
//! Body decoding uses simd-json; response encoding streams through
//! serde_json straight into the response buffer.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;

/// Content type set by JSON responses
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Parse JSON bytes to a typed value using simd-json
///
/// simd-json parses in place, so the input is copied into a scratch buffer
/// first.
///
/// # Errors
///
/// Returns `Error::Decode` if parsing fails
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut scratch = bytes.to_vec();
    simd_json::from_slice(&mut scratch).map_err(|e| Error::Decode {
        reason: e.to_string(),
    })
}

/// Serialize `value` into `writer`
///
/// Output is streamed: when encoding fails midway, whatever was already
/// written stays in `writer`.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails
pub fn to_writer<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(writer, value)?;
    Ok(())
}

/// Serialize a value to JSON string
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
