//! Bulk sealing and opening of documents by path group.
//!
//! # Entry points
//!
//! | document | seal | open | absent path |
//! |---|---|---|---|
//! | typed struct ([`Document`](crate::Document)) | [`FieldCipher::encrypt_struct`] | [`FieldCipher::decrypt_struct`] | skipped |
//! | JSON tree ([`serde_json::Value`]) | [`FieldCipher::encrypt_maps`] | [`FieldCipher::decrypt_maps`] | [`FieldCipherError::FieldNotFound`] unless the group is optional |
//!
//! Every entry point computes all new values first and writes only once the
//! whole batch has succeeded. A failing field leaves the document untouched.

pub mod maps;
pub mod structs;

pub use maps::{Edit, EditSet};

use thiserror::Error;

use crate::crypto::{CipherBox, CipherError, CipherMode, CodecError, FieldKey};
use crate::path::{FieldPath, PathError};
use crate::value::SealError;

/// Errors produced by the field cipher driver.
///
/// Every variant names the field path (or, for JSON trees, the concrete
/// location) that failed. Values are never included.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldCipherError {
    /// A path failed to parse or resolve.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A struct path resolved to a field that is not an encrypted value.
    #[error("field {path} is not encryptable")]
    FieldNotEncryptable { path: String },

    /// A required map path matched nothing in the whole document.
    #[error("field {path} not found")]
    FieldNotFound { path: String },

    /// Sealing or opening an encrypted struct field failed.
    #[error("field {path}: {source}")]
    Seal {
        path: String,
        #[source]
        source: SealError,
    },

    /// A JSON leaf could not be encoded or decoded.
    #[error("field {path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: CodecError,
    },

    /// A JSON leaf could not be encrypted or decrypted.
    #[error("field {path}: {source}")]
    Cipher {
        path: String,
        #[source]
        source: CipherError,
    },
}

/// The flat error taxonomy, independent of where in the stack an error arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedType,
    TruncatedHeader,
    UnknownTypeTag,
    PayloadLengthMismatch,
    InvalidUtf8,
    InvalidKeyLength,
    InvalidBlob,
    AuthenticationFailed,
    InvalidPadding,
    EncryptionFailed,
    EmptyValue,
    EmptyRaw,
    TypeMismatch,
    InvalidPath,
    NotAddressable,
    FieldNotEncryptable,
    FieldNotFound,
}

impl From<&CodecError> for ErrorKind {
    fn from(e: &CodecError) -> Self {
        match e {
            CodecError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            CodecError::TruncatedHeader => ErrorKind::TruncatedHeader,
            CodecError::UnknownTypeTag(_) => ErrorKind::UnknownTypeTag,
            CodecError::PayloadLengthMismatch { .. } => ErrorKind::PayloadLengthMismatch,
            CodecError::InvalidUtf8 => ErrorKind::InvalidUtf8,
        }
    }
}

impl From<&CipherError> for ErrorKind {
    fn from(e: &CipherError) -> Self {
        match e {
            CipherError::InvalidKeyLength => ErrorKind::InvalidKeyLength,
            CipherError::InvalidBlob => ErrorKind::InvalidBlob,
            CipherError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            CipherError::InvalidPadding => ErrorKind::InvalidPadding,
            CipherError::EncryptionFailed => ErrorKind::EncryptionFailed,
        }
    }
}

impl From<&SealError> for ErrorKind {
    fn from(e: &SealError) -> Self {
        match e {
            SealError::EmptyValue(_) => ErrorKind::EmptyValue,
            SealError::EmptyRaw => ErrorKind::EmptyRaw,
            SealError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            SealError::Codec(inner) => inner.into(),
            SealError::Cipher(inner) => inner.into(),
        }
    }
}

impl FieldCipherError {
    /// The innermost taxonomy entry this error represents.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FieldCipherError::Path(PathError::InvalidPath(_)) => ErrorKind::InvalidPath,
            FieldCipherError::Path(PathError::NotAddressable(_)) => ErrorKind::NotAddressable,
            FieldCipherError::FieldNotEncryptable { .. } => ErrorKind::FieldNotEncryptable,
            FieldCipherError::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            FieldCipherError::Seal { source, .. } => source.into(),
            FieldCipherError::Codec { source, .. } => source.into(),
            FieldCipherError::Cipher { source, .. } => source.into(),
        }
    }
}

/// Whether a map group tolerates paths that match nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    /// Every path must match at least once in the document.
    #[default]
    Required,
    /// Paths that match nothing are skipped.
    Optional,
}

/// A named set of field paths sharing one encryption policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGroup {
    name: String,
    mode: CipherMode,
    presence: Presence,
    paths: Vec<FieldPath>,
}

impl PathGroup {
    /// Build a group of required AEAD paths.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidPath`] if any path is malformed.
    pub fn new<I, S>(name: impl Into<String>, paths: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| FieldPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            mode: CipherMode::default(),
            presence: Presence::default(),
            paths,
        })
    }

    /// Seal and open this group's fields with `mode`.
    pub fn with_mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }

    /// Let map documents omit this group's fields.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }
}

/// The driver: one key, any number of documents.
///
/// Stateless apart from the key, so a single instance can be shared across
/// threads. A single document must not be processed by two calls at once.
#[derive(Debug, Clone)]
pub struct FieldCipher {
    key: FieldKey,
}

impl FieldCipher {
    /// Create a driver over `key`.
    pub fn new(key: FieldKey) -> Self {
        Self { key }
    }

    /// A cipher box in the group's mode.
    pub fn cipher_for(&self, group: &PathGroup) -> CipherBox<'_> {
        CipherBox::new(&self.key, group.mode())
    }
}
