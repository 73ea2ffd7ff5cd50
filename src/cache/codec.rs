//! Codec Module
//!
//! Length-prefixed JSON encoding for values written to the storage medium.
//!
//! Encoded form: `<byte length of json>|<json>`. A length mismatch means the
//! value was truncated or tampered with and is reported as a miss.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Separates the length prefix from the payload.
pub const DELIMITER: char = '|';

// == Encode ==
/// Serializes a value and prefixes it with its byte length.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(format!("{}{}{}", json.len(), DELIMITER, json))
}

// == Decode ==
/// Parses an encoded value.
///
/// Returns `None` when the prefix is missing, the declared length does not
/// match the payload, or the payload is not valid for `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let (prefix, payload) = raw.split_once(DELIMITER)?;

    let declared: usize = match prefix.parse() {
        Ok(len) => len,
        Err(_) => {
            debug!("Codec: malformed length prefix {:?}", prefix);
            return None;
        }
    };

    if declared != payload.len() {
        debug!(
            "Codec: length mismatch, declared {} but found {}",
            declared,
            payload.len()
        );
        return None;
    }

    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("Codec: payload failed to parse: {}", err);
            None
        }
    }
}
