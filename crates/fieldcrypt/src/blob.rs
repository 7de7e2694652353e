//! Text form of sealed blobs inside JSON documents.
//!
//! Sealed leaves are written as standard base64 strings. On the way back in,
//! an array of byte values is accepted as well, which is how raw byte vectors
//! serialise through `serde_json`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::crypto::CipherError;

/// Render a sealed blob as a JSON string.
pub fn to_value(sealed: &[u8]) -> Value {
    Value::String(STANDARD.encode(sealed))
}

/// Read a sealed blob back out of a JSON leaf.
///
/// # Errors
///
/// Returns [`CipherError::InvalidBlob`] if the leaf is neither valid base64
/// text nor an array of integers in `0..=255`.
pub fn from_value(leaf: &Value) -> Result<Vec<u8>, CipherError> {
    match leaf {
        Value::String(text) => STANDARD
            .decode(text)
            .map_err(|_| CipherError::InvalidBlob),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or(CipherError::InvalidBlob)
            })
            .collect(),
        _ => Err(CipherError::InvalidBlob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_form_is_standard_base64() {
        assert_eq!(to_value(&[0xfb, 0xff, 0x00]), json!("+/8A"));
        assert_eq!(from_value(&json!("+/8A")).unwrap(), [0xfb, 0xff, 0x00]);
    }

    #[test]
    fn byte_arrays_are_accepted() {
        assert_eq!(from_value(&json!([1, 2, 255])).unwrap(), [1, 2, 255]);
        assert_eq!(from_value(&json!([])).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn anything_else_is_invalid() {
        for leaf in [
            json!("not base64 !!"),
            json!([1, 256]),
            json!([1, -1]),
            json!(["a"]),
            json!(42),
            json!(null),
            json!({"raw": "AA=="}),
        ] {
            assert_eq!(from_value(&leaf), Err(CipherError::InvalidBlob), "{leaf}");
        }
    }
}
