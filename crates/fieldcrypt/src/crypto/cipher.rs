//! Symmetric sealing of byte strings under the shared [`FieldKey`].
//!
//! Two modes share one blob layout, `prefix || ciphertext`:
//!
//! - [`CipherMode::Aead`]: AES-256-GCM-SIV. Prefix is a 12-byte nonce; the
//!   16-byte authentication tag is folded into the ciphertext tail.
//! - [`CipherMode::Block`]: AES-256-CBC with PKCS#7 padding. Prefix is a
//!   16-byte IV; the ciphertext is always a whole number of blocks.
//!
//! The mode is not recorded in the blob. Whoever opens a blob must use the
//! mode that sealed it.
//!
//! **Every seal draws a fresh nonce / IV from the OS CSPRNG.** Never reuse a
//! nonce under the same key.

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::key::FieldKey;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of an AES block, and therefore of the CBC IV.
pub const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key could not initialise the cipher.
    #[error("invalid key length")]
    InvalidKeyLength,

    /// The blob is too short or misaligned for the mode that is opening it.
    #[error("sealed blob is malformed")]
    InvalidBlob,

    /// The AEAD tag did not verify: tampered data or the wrong key.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The decrypted block-mode plaintext carries invalid padding.
    #[error("invalid block padding")]
    InvalidPadding,

    /// The underlying primitive refused to encrypt.
    #[error("encryption failed")]
    EncryptionFailed,
}

/// Which construction a [`CipherBox`] seals with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// AES-256-GCM-SIV with a random nonce.
    #[default]
    Aead,
    /// AES-256-CBC + PKCS#7 with a random IV. Kept for legacy ciphertext.
    Block,
}

impl CipherMode {
    /// Length of the randomness prefix at the start of every blob.
    pub const fn prefix_len(self) -> usize {
        match self {
            CipherMode::Aead => NONCE_LEN,
            CipherMode::Block => BLOCK_LEN,
        }
    }
}

/// A key paired with a mode. Cheap to build; borrows the key.
#[derive(Debug, Clone, Copy)]
pub struct CipherBox<'k> {
    key: &'k FieldKey,
    mode: CipherMode,
}

impl<'k> CipherBox<'k> {
    /// Pair `key` with `mode`.
    pub fn new(key: &'k FieldKey, mode: CipherMode) -> Self {
        Self { key, mode }
    }

    /// Shorthand for [`CipherMode::Aead`].
    pub fn aead(key: &'k FieldKey) -> Self {
        Self::new(key, CipherMode::Aead)
    }

    /// Shorthand for [`CipherMode::Block`].
    pub fn block(key: &'k FieldKey) -> Self {
        Self::new(key, CipherMode::Block)
    }

    /// The mode this box seals and opens with.
    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Encrypt `plaintext` into `prefix || ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] or
    /// [`CipherError::EncryptionFailed`]; neither is reachable with a
    /// well-formed [`FieldKey`].
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self.mode {
            CipherMode::Aead => self.seal_aead(plaintext),
            CipherMode::Block => self.seal_block(plaintext),
        }
    }

    /// Decrypt a blob produced by [`CipherBox::seal`] in the same mode.
    ///
    /// # Errors
    ///
    /// - [`CipherError::InvalidBlob`] if the blob is shorter than the prefix
    ///   (or, in block mode, the ciphertext is not a whole number of blocks).
    /// - [`CipherError::AuthenticationFailed`] if the AEAD tag check fails.
    /// - [`CipherError::InvalidPadding`] if block-mode padding is invalid.
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self.mode {
            CipherMode::Aead => self.open_aead(blob),
            CipherMode::Block => self.open_block(blob),
        }
    }

    fn seal_aead(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let cipher = Aes256GcmSiv::new_from_slice(self.key.as_bytes())
            .map_err(|_| CipherError::InvalidKeyLength)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn open_aead(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < NONCE_LEN {
            return Err(CipherError::InvalidBlob);
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = Aes256GcmSiv::new_from_slice(self.key.as_bytes())
            .map_err(|_| CipherError::InvalidKeyLength)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::AuthenticationFailed)
    }

    fn seal_block(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut iv = [0u8; BLOCK_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(self.key.as_bytes(), &iv)
            .map_err(|_| CipherError::InvalidKeyLength)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut blob = Vec::with_capacity(BLOCK_LEN + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn open_block(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < BLOCK_LEN {
            return Err(CipherError::InvalidBlob);
        }
        let (iv, ciphertext) = blob.split_at(BLOCK_LEN);
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CipherError::InvalidBlob);
        }
        Aes256CbcDec::new_from_slices(self.key.as_bytes(), iv)
            .map_err(|_| CipherError::InvalidKeyLength)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::InvalidPadding)
    }
}
