//! Field-level cryptographic primitives.
//!
//! This module is intentionally free of any knowledge of documents or paths.
//! It provides the typed codec, the cipher box and the key type used by the
//! container and driver layers.
//!
//! # Sealed value format
//!
//! ```text
//! prefix (nonce | iv) || encrypt( [tag][payload] )
//! ```

pub mod cipher;
pub mod codec;
pub mod key;

pub use cipher::{CipherBox, CipherError, CipherMode};
pub use codec::{CodecError, Scalar, ScalarKind, ScalarType};
pub use key::{FieldKey, KeyError, KEY_LEN};
