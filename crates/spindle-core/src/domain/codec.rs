//! Wire codec for store cells: JSON text in both directions.

use serde_json::Value;

use super::errors::{DecodeError, EncodeError};

pub fn decode(raw: &str) -> Result<Value, DecodeError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode(value: &Value) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(value)?)
}
