//! Tagged scalar encoding used as the plaintext inside every sealed blob.
//!
//! # Wire format
//!
//! ```text
//! [tag: u8][payload]
//!
//! 0x01  string   UTF-8 bytes, variable length
//! 0x02  int64    8 bytes, big-endian two's complement
//! 0x03  float32  4 bytes, big-endian IEEE-754
//! 0x04  float64  8 bytes, big-endian IEEE-754
//! ```
//!
//! The tag travels inside the ciphertext, so a decoder always learns the
//! concrete type of a value independently of whatever the call site expects.

use std::fmt;

use serde_json::{Number, Value};
use thiserror::Error;

/// Tag byte for UTF-8 strings.
pub const TAG_STRING: u8 = 0x01;
/// Tag byte for 64-bit signed integers.
pub const TAG_INT64: u8 = 0x02;
/// Tag byte for 32-bit floats.
pub const TAG_FLOAT32: u8 = 0x03;
/// Tag byte for 64-bit floats.
pub const TAG_FLOAT64: u8 = 0x04;

/// Errors produced while encoding or decoding a tagged scalar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The value is not one of the four supported scalar types.
    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),

    /// The input was empty; there is no tag byte to read.
    #[error("tagged value is empty")]
    TruncatedHeader,

    /// The tag byte is not a known scalar type.
    #[error("unknown type tag 0x{0:02x}")]
    UnknownTypeTag(u8),

    /// A numeric payload has the wrong width for its tag.
    #[error("{kind} payload must be {expected} bytes, got {actual}")]
    PayloadLengthMismatch {
        kind: ScalarKind,
        expected: usize,
        actual: usize,
    },

    /// A string payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// The concrete type carried by a [`Scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Str,
    Int,
    F32,
    F64,
}

impl ScalarKind {
    /// Tag byte written in front of the payload.
    pub const fn tag(self) -> u8 {
        match self {
            ScalarKind::Str => TAG_STRING,
            ScalarKind::Int => TAG_INT64,
            ScalarKind::F32 => TAG_FLOAT32,
            ScalarKind::F64 => TAG_FLOAT64,
        }
    }

    /// Map a tag byte back to its kind.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_STRING => Some(ScalarKind::Str),
            TAG_INT64 => Some(ScalarKind::Int),
            TAG_FLOAT32 => Some(ScalarKind::F32),
            TAG_FLOAT64 => Some(ScalarKind::F64),
            _ => None,
        }
    }

    /// Fixed payload width, or `None` for variable-length strings.
    pub const fn payload_width(self) -> Option<usize> {
        match self {
            ScalarKind::Str => None,
            ScalarKind::Int | ScalarKind::F64 => Some(8),
            ScalarKind::F32 => Some(4),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ScalarKind::Str => "string",
            ScalarKind::Int => "int64",
            ScalarKind::F32 => "float32",
            ScalarKind::F64 => "float64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A plaintext scalar of one of the four supported types.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// The concrete kind of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Str(_) => ScalarKind::Str,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
        }
    }

    /// Convert a dynamically-typed JSON leaf into a scalar.
    ///
    /// Strings map to [`Scalar::Str`], integers that fit in `i64` to
    /// [`Scalar::Int`] and every other number to [`Scalar::F64`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedType`] for nulls, booleans, arrays,
    /// objects and unsigned integers above `i64::MAX`.
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => Ok(Scalar::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else if n.is_u64() {
                    Err(CodecError::UnsupportedType("unsigned integer above i64::MAX"))
                } else {
                    n.as_f64()
                        .map(Scalar::F64)
                        .ok_or(CodecError::UnsupportedType("number"))
                }
            }
            Value::Null => Err(CodecError::UnsupportedType("null")),
            Value::Bool(_) => Err(CodecError::UnsupportedType("bool")),
            Value::Array(_) => Err(CodecError::UnsupportedType("array")),
            Value::Object(_) => Err(CodecError::UnsupportedType("object")),
        }
    }

    /// Convert back into a JSON leaf.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedType`] for NaN or infinite floats,
    /// which JSON cannot represent.
    pub fn into_json(self) -> Result<Value, CodecError> {
        match self {
            Scalar::Str(s) => Ok(Value::String(s)),
            Scalar::Int(i) => Ok(Value::Number(i.into())),
            Scalar::F32(f) => Number::from_f64(f64::from(f))
                .map(Value::Number)
                .ok_or(CodecError::UnsupportedType("non-finite float32")),
            Scalar::F64(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or(CodecError::UnsupportedType("non-finite float64")),
        }
    }
}

/// Encode a scalar as `[tag][payload]`.
pub fn encode(value: &Scalar) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + value.kind().payload_width().unwrap_or(16));
    out.push(value.kind().tag());
    match value {
        Scalar::Str(s) => out.extend_from_slice(s.as_bytes()),
        Scalar::Int(i) => out.extend_from_slice(&i.to_be_bytes()),
        Scalar::F32(f) => out.extend_from_slice(&f.to_be_bytes()),
        Scalar::F64(f) => out.extend_from_slice(&f.to_be_bytes()),
    }
    out
}

/// Encode a JSON leaf, failing if its runtime type is not a supported scalar.
pub fn encode_json(value: &Value) -> Result<Vec<u8>, CodecError> {
    Scalar::from_json(value).map(|s| encode(&s))
}

/// Decode a tagged byte sequence produced by [`encode`].
///
/// # Errors
///
/// - [`CodecError::TruncatedHeader`] if `bytes` is empty.
/// - [`CodecError::UnknownTypeTag`] if the first byte is not a known tag.
/// - [`CodecError::PayloadLengthMismatch`] if a numeric payload has the wrong width.
/// - [`CodecError::InvalidUtf8`] if a string payload is not UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Scalar, CodecError> {
    let (&tag, payload) = bytes.split_first().ok_or(CodecError::TruncatedHeader)?;
    let kind = ScalarKind::from_tag(tag).ok_or(CodecError::UnknownTypeTag(tag))?;

    if let Some(expected) = kind.payload_width() {
        if payload.len() != expected {
            return Err(CodecError::PayloadLengthMismatch {
                kind,
                expected,
                actual: payload.len(),
            });
        }
    }

    Ok(match kind {
        ScalarKind::Str => Scalar::Str(
            String::from_utf8(payload.to_vec()).map_err(|_| CodecError::InvalidUtf8)?,
        ),
        ScalarKind::Int => Scalar::Int(i64::from_be_bytes(fixed(payload))),
        ScalarKind::F32 => Scalar::F32(f32::from_be_bytes(fixed(payload))),
        ScalarKind::F64 => Scalar::F64(f64::from_be_bytes(fixed(payload))),
    })
}

// Width is checked by the caller.
fn fixed<const N: usize>(payload: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(payload);
    buf
}

mod private {
    pub trait Sealed {}
    impl Sealed for String {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Rust types that can live inside an [`EncryptedValue`](crate::EncryptedValue).
///
/// Implemented for exactly `String`, `i64`, `f32` and `f64`.
pub trait ScalarType: Clone + Default + private::Sealed {
    /// The kind this type encodes as.
    const KIND: ScalarKind;

    /// Copy this value into a [`Scalar`].
    fn to_scalar(&self) -> Scalar;

    /// Take the value out of a [`Scalar`] of the matching kind.
    ///
    /// Returns the scalar unchanged when the kinds differ.
    fn from_scalar(value: Scalar) -> Result<Self, Scalar>;

    /// Whether this is the type's zero value.
    fn is_zero(&self) -> bool;
}

impl ScalarType for String {
    const KIND: ScalarKind = ScalarKind::Str;

    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.clone())
    }

    fn from_scalar(value: Scalar) -> Result<Self, Scalar> {
        match value {
            Scalar::Str(s) => Ok(s),
            other => Err(other),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ScalarType for i64 {
    const KIND: ScalarKind = ScalarKind::Int;

    fn to_scalar(&self) -> Scalar {
        Scalar::Int(*self)
    }

    fn from_scalar(value: Scalar) -> Result<Self, Scalar> {
        match value {
            Scalar::Int(i) => Ok(i),
            other => Err(other),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl ScalarType for f32 {
    const KIND: ScalarKind = ScalarKind::F32;

    fn to_scalar(&self) -> Scalar {
        Scalar::F32(*self)
    }

    fn from_scalar(value: Scalar) -> Result<Self, Scalar> {
        match value {
            Scalar::F32(f) => Ok(f),
            other => Err(other),
        }
    }

    // Bit-exact: -0.0 is a real value, only +0.0 counts as unset.
    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}

impl ScalarType for f64 {
    const KIND: ScalarKind = ScalarKind::F64;

    fn to_scalar(&self) -> Scalar {
        Scalar::F64(*self)
    }

    fn from_scalar(value: Scalar) -> Result<Self, Scalar> {
        match value {
            Scalar::F64(f) => Ok(f),
            other => Err(other),
        }
    }

    fn is_zero(&self) -> bool {
        self.to_bits() == 0
    }
}
