//! [`EncryptedValue`]: a typed plaintext paired with its sealed form.
//!
//! # Lifecycle
//!
//! 1. Deserialised from a request document: `value` set, `raw` empty.
//! 2. [`Sealable::seal`] on the outbound path: `raw` becomes
//!    `CipherBox::seal(codec::encode(value))`.
//! 3. The storage writer persists [`EncryptedValue::raw`] on its own. The
//!    serialised form of the container is the plaintext only, so `raw` never
//!    leaks into JSON.
//! 4. [`Sealable::open`] on the inbound path: `value` becomes whatever `raw`
//!    decodes to.
//!
//! `value` and `raw` are not kept in step. Mutating the value after a seal
//! leaves a stale `raw` until the next seal.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::crypto::{codec, CipherBox, CipherError, CodecError, Scalar, ScalarKind, ScalarType};

/// Errors produced while sealing or opening a single container.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    /// `seal` was called while the plaintext is still the zero value.
    #[error("cannot seal an empty {0} value")]
    EmptyValue(ScalarKind),

    /// `open` was called before any sealed bytes were set.
    #[error("no sealed bytes to open")]
    EmptyRaw,

    /// The blob decoded to a different scalar type than the container holds.
    #[error("sealed value is {found}, expected {expected}")]
    TypeMismatch {
        expected: ScalarKind,
        found: ScalarKind,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// A field that knows how to seal and open itself.
///
/// The split into compute (`sealed_raw`, `opened_value`) and store
/// (`store_raw`, `store_value`) halves lets the driver compute every field of
/// a batch before touching any of them.
pub trait Sealable {
    /// Kind of scalar this field holds.
    fn kind(&self) -> ScalarKind;

    /// Encode and encrypt the current plaintext without storing the result.
    fn sealed_raw(&self, cipher: &CipherBox<'_>) -> Result<Vec<u8>, SealError>;

    /// Decrypt and decode the current sealed bytes without storing the result.
    ///
    /// The returned scalar is guaranteed to have kind [`Sealable::kind`].
    fn opened_value(&self, cipher: &CipherBox<'_>) -> Result<Scalar, SealError>;

    /// Replace the sealed bytes.
    fn store_raw(&mut self, raw: Vec<u8>);

    /// Replace the plaintext with an already-opened scalar.
    fn store_value(&mut self, value: Scalar) -> Result<(), SealError>;

    /// Encode-then-encrypt the plaintext into the sealed bytes.
    fn seal(&mut self, cipher: &CipherBox<'_>) -> Result<(), SealError> {
        let raw = self.sealed_raw(cipher)?;
        self.store_raw(raw);
        Ok(())
    }

    /// Decrypt-then-decode the sealed bytes into the plaintext.
    fn open(&mut self, cipher: &CipherBox<'_>) -> Result<(), SealError> {
        let value = self.opened_value(cipher)?;
        self.store_value(value)
    }
}

/// A scalar field that is stored encrypted and served in plaintext.
///
/// `T` is one of `String`, `i64`, `f32`, `f64`.
#[derive(Clone, Default)]
pub struct EncryptedValue<T: ScalarType> {
    value: T,
    raw: Vec<u8>,
}

impl<T: ScalarType> EncryptedValue<T> {
    /// Wrap a plaintext value. Nothing is sealed yet.
    pub fn new(value: T) -> Self {
        Self {
            value,
            raw: Vec::new(),
        }
    }

    /// A container holding only sealed bytes, as read back from storage.
    pub fn with_raw(raw: Vec<u8>) -> Self {
        Self {
            value: T::default(),
            raw,
        }
    }

    /// The plaintext value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the plaintext. Re-seal afterwards.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Replace the plaintext. Re-seal afterwards.
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Consume the container, returning the plaintext.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The sealed bytes; empty until a successful seal.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Whether sealed bytes are present.
    pub fn is_sealed(&self) -> bool {
        !self.raw.is_empty()
    }

    /// See [`Sealable::seal`].
    pub fn seal(&mut self, cipher: &CipherBox<'_>) -> Result<(), SealError> {
        Sealable::seal(self, cipher)
    }

    /// See [`Sealable::open`].
    pub fn open(&mut self, cipher: &CipherBox<'_>) -> Result<(), SealError> {
        Sealable::open(self, cipher)
    }
}

impl<T: ScalarType> Sealable for EncryptedValue<T> {
    fn kind(&self) -> ScalarKind {
        T::KIND
    }

    fn sealed_raw(&self, cipher: &CipherBox<'_>) -> Result<Vec<u8>, SealError> {
        if self.value.is_zero() {
            return Err(SealError::EmptyValue(T::KIND));
        }
        let encoded = codec::encode(&self.value.to_scalar());
        Ok(cipher.seal(&encoded)?)
    }

    fn opened_value(&self, cipher: &CipherBox<'_>) -> Result<Scalar, SealError> {
        if self.raw.is_empty() {
            return Err(SealError::EmptyRaw);
        }
        let decoded = codec::decode(&cipher.open(&self.raw)?)?;
        if decoded.kind() != T::KIND {
            return Err(SealError::TypeMismatch {
                expected: T::KIND,
                found: decoded.kind(),
            });
        }
        Ok(decoded)
    }

    fn store_raw(&mut self, raw: Vec<u8>) {
        self.raw = raw;
    }

    fn store_value(&mut self, value: Scalar) -> Result<(), SealError> {
        self.value = T::from_scalar(value).map_err(|other| SealError::TypeMismatch {
            expected: T::KIND,
            found: other.kind(),
        })?;
        Ok(())
    }
}

impl<T: ScalarType + PartialEq> PartialEq for EncryptedValue<T> {
    /// Compares plaintext only; `raw` is a transient artifact.
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: ScalarType> fmt::Debug for EncryptedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedValue")
            .field("kind", &T::KIND)
            .field("value", &"[REDACTED]")
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

impl<T: ScalarType> From<T> for EncryptedValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ScalarType + Serialize> Serialize for EncryptedValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: ScalarType + Deserialize<'de>> Deserialize<'de> for EncryptedValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::FieldKey;

    #[test]
    fn seal_then_open_round_trips_each_type() {
        let key = FieldKey::generate();
        for cipher in [CipherBox::aead(&key), CipherBox::block(&key)] {
            let mut s = EncryptedValue::new("Engineer".to_string());
            s.seal(&cipher).unwrap();
            let mut back = EncryptedValue::<String>::with_raw(s.raw().to_vec());
            back.open(&cipher).unwrap();
            assert_eq!(back.value(), "Engineer");

            let mut i = EncryptedValue::new(-42i64);
            i.seal(&cipher).unwrap();
            i.set_value(0);
            i.open(&cipher).unwrap();
            assert_eq!(*i.value(), -42);

            let mut f = EncryptedValue::new(1.25f32);
            f.seal(&cipher).unwrap();
            f.open(&cipher).unwrap();
            assert_eq!(*f.value(), 1.25);

            let mut d = EncryptedValue::new(98_000.5f64);
            d.seal(&cipher).unwrap();
            d.open(&cipher).unwrap();
            assert_eq!(*d.value(), 98_000.5);
        }
    }

    #[test]
    fn sealing_twice_gives_different_blobs() {
        let key = FieldKey::generate();
        let cipher = CipherBox::aead(&key);
        let mut v = EncryptedValue::new("same".to_string());
        v.seal(&cipher).unwrap();
        let first = v.raw().to_vec();
        v.seal(&cipher).unwrap();
        assert_ne!(first, v.raw());

        let mut a = EncryptedValue::<String>::with_raw(first);
        a.open(&cipher).unwrap();
        v.open(&cipher).unwrap();
        assert_eq!(a, v);
    }

    #[test]
    fn zero_value_cannot_be_sealed() {
        let key = FieldKey::generate();
        let cipher = CipherBox::aead(&key);
        assert_eq!(
            EncryptedValue::new(String::new()).seal(&cipher),
            Err(SealError::EmptyValue(ScalarKind::Str))
        );
        assert_eq!(
            EncryptedValue::new(0i64).seal(&cipher),
            Err(SealError::EmptyValue(ScalarKind::Int))
        );
        assert_eq!(
            EncryptedValue::new(0.0f64).seal(&cipher),
            Err(SealError::EmptyValue(ScalarKind::F64))
        );
    }

    #[test]
    fn unset_raw_cannot_be_opened() {
        let key = FieldKey::generate();
        let cipher = CipherBox::aead(&key);
        assert_eq!(
            EncryptedValue::<String>::default().open(&cipher),
            Err(SealError::EmptyRaw)
        );
        assert_eq!(
            EncryptedValue::new(5i64).open(&cipher),
            Err(SealError::EmptyRaw)
        );
    }

    #[test]
    fn opening_into_the_wrong_type_is_a_mismatch() {
        let key = FieldKey::generate();
        let cipher = CipherBox::aead(&key);
        let mut s = EncryptedValue::new("7".to_string());
        s.seal(&cipher).unwrap();

        let mut i = EncryptedValue::<i64>::with_raw(s.raw().to_vec());
        assert_eq!(
            i.open(&cipher),
            Err(SealError::TypeMismatch {
                expected: ScalarKind::Int,
                found: ScalarKind::Str
            })
        );
        assert_eq!(*i.value(), 0);
    }

    #[test]
    fn cipher_errors_surface() {
        let key = FieldKey::generate();
        let cipher = CipherBox::aead(&key);
        let mut v = EncryptedValue::new("secret".to_string());
        v.seal(&cipher).unwrap();

        let mut tampered = v.raw().to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert_eq!(
            EncryptedValue::<String>::with_raw(tampered).open(&cipher),
            Err(SealError::Cipher(CipherError::AuthenticationFailed))
        );

        let other = FieldKey::generate();
        assert_eq!(
            EncryptedValue::<String>::with_raw(v.raw().to_vec()).open(&CipherBox::aead(&other)),
            Err(SealError::Cipher(CipherError::AuthenticationFailed))
        );
    }

    #[test]
    fn serializes_as_plaintext_only() {
        let key = FieldKey::generate();
        let mut v = EncryptedValue::new("Engineer".to_string());
        v.seal(&CipherBox::aead(&key)).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"Engineer\"");

        let back: EncryptedValue<i64> = serde_json::from_str("1987").unwrap();
        assert_eq!(*back.value(), 1987);
        assert!(!back.is_sealed());
    }

    #[test]
    fn debug_redacts_plaintext() {
        let v = EncryptedValue::new("123-45-6789".to_string());
        let out = format!("{v:?}");
        assert!(out.contains("REDACTED"));
        assert!(!out.contains("123-45-6789"));
    }

    #[test]
    fn store_value_rejects_wrong_kind() {
        let mut v = EncryptedValue::<f32>::default();
        assert!(v.store_value(Scalar::F64(1.0)).is_err());
        v.store_value(Scalar::F32(2.0)).unwrap();
        assert_eq!(*v.value(), 2.0);
    }
}
