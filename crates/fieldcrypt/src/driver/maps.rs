//! Map driver: seal and open scalar leaves of a JSON tree in place.
//!
//! Unlike the struct driver, leaves here are plain scalars, not
//! [`EncryptedValue`](crate::EncryptedValue)s. A sealed leaf is stored as the
//! base64 text of its blob (see [`crate::blob`]).

use serde_json::Value;
use tracing::debug;

use super::{FieldCipher, FieldCipherError, PathGroup, Presence};
use crate::blob;
use crate::crypto::{codec, CipherBox, Scalar};
use crate::path::{resolve_dynamic, FieldPath, Location};

/// One planned replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub location: Location,
    pub value: Value,
}

/// A batch of replacements computed against a document, not yet applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Write every edit into `root`.
    ///
    /// Locations that no longer exist in `root` are skipped; apply to the
    /// document the set was planned against.
    pub fn apply(self, root: &mut Value) {
        for edit in self.edits {
            if let Some(slot) = edit.location.get_mut(root) {
                *slot = edit.value;
            }
        }
    }
}

impl IntoIterator for EditSet {
    type Item = Edit;
    type IntoIter = std::vec::IntoIter<Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.into_iter()
    }
}

impl FieldCipher {
    /// Seal every scalar leaf named by `groups`, replacing it with the base64
    /// text of its sealed blob. `null` leaves are left as they are.
    ///
    /// # Errors
    ///
    /// See [`FieldCipher::plan_encrypt_maps`]. On error `doc` is unchanged.
    pub fn encrypt_maps(&self, doc: &mut Value, groups: &[PathGroup]) -> Result<(), FieldCipherError> {
        self.plan_encrypt_maps(doc, groups)?.apply(doc);
        Ok(())
    }

    /// Open every sealed leaf named by `groups`, replacing it with its
    /// plaintext scalar. `null` leaves are left as they are.
    ///
    /// # Errors
    ///
    /// See [`FieldCipher::plan_decrypt_maps`]. On error `doc` is unchanged.
    pub fn decrypt_maps(&self, doc: &mut Value, groups: &[PathGroup]) -> Result<(), FieldCipherError> {
        self.plan_decrypt_maps(doc, groups)?.apply(doc);
        Ok(())
    }

    /// Compute the edits [`FieldCipher::encrypt_maps`] would make.
    ///
    /// # Errors
    ///
    /// - [`FieldCipherError::FieldNotFound`] if a path of a required group
    ///   matches nothing anywhere in `doc`.
    /// - [`FieldCipherError::Codec`] if a leaf is not a string or number.
    /// - [`FieldCipherError::Cipher`] if encryption fails.
    pub fn plan_encrypt_maps(&self, doc: &Value, groups: &[PathGroup]) -> Result<EditSet, FieldCipherError> {
        self.plan(doc, groups, "sealing map path", seal_leaf)
    }

    /// Compute the edits [`FieldCipher::decrypt_maps`] would make.
    ///
    /// # Errors
    ///
    /// - [`FieldCipherError::FieldNotFound`] if a path of a required group
    ///   matches nothing anywhere in `doc`.
    /// - [`FieldCipherError::Cipher`] if a leaf is not a sealed blob, fails
    ///   authentication, or carries bad padding.
    /// - [`FieldCipherError::Codec`] if the decrypted bytes are not a valid
    ///   tagged scalar.
    pub fn plan_decrypt_maps(&self, doc: &Value, groups: &[PathGroup]) -> Result<EditSet, FieldCipherError> {
        self.plan(doc, groups, "opening map path", open_leaf)
    }

    fn plan(
        &self,
        doc: &Value,
        groups: &[PathGroup],
        action: &'static str,
        transform: fn(&CipherBox<'_>, &Value, &Location) -> Result<Value, FieldCipherError>,
    ) -> Result<EditSet, FieldCipherError> {
        let mut edits = Vec::new();
        for group in groups {
            let cipher = self.cipher_for(group);
            for path in group.paths() {
                let locations = resolve_dynamic(doc, path);
                debug!(group = group.name(), path = %path, matches = locations.len(), "{action}");
                ensure_present(group, path, &locations)?;

                for location in locations {
                    let Some(current) = location.get(doc) else {
                        continue;
                    };
                    if current.is_null() {
                        continue;
                    }
                    let value = transform(&cipher, current, &location)?;
                    edits.push(Edit { location, value });
                }
            }
        }
        Ok(EditSet { edits })
    }
}

fn ensure_present(group: &PathGroup, path: &FieldPath, locations: &[Location]) -> Result<(), FieldCipherError> {
    if locations.is_empty() && group.presence() == Presence::Required {
        return Err(FieldCipherError::FieldNotFound {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn seal_leaf(cipher: &CipherBox<'_>, current: &Value, location: &Location) -> Result<Value, FieldCipherError> {
    let encoded = codec::encode_json(current).map_err(|source| FieldCipherError::Codec {
        path: location.to_string(),
        source,
    })?;
    let sealed = cipher.seal(&encoded).map_err(|source| FieldCipherError::Cipher {
        path: location.to_string(),
        source,
    })?;
    Ok(blob::to_value(&sealed))
}

fn open_leaf(cipher: &CipherBox<'_>, current: &Value, location: &Location) -> Result<Value, FieldCipherError> {
    let cipher_err = |source| FieldCipherError::Cipher {
        path: location.to_string(),
        source,
    };
    let codec_err = |source| FieldCipherError::Codec {
        path: location.to_string(),
        source,
    };

    let sealed = blob::from_value(current).map_err(cipher_err)?;
    let plaintext = cipher.open(&sealed).map_err(cipher_err)?;
    codec::decode(&plaintext)
        .and_then(Scalar::into_json)
        .map_err(codec_err)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crypto::{CipherMode, FieldKey};
    use crate::driver::ErrorKind;

    fn group(paths: &[&str]) -> PathGroup {
        PathGroup::new("test", paths.iter().copied()).unwrap()
    }

    #[test]
    fn round_trips_scalars_in_place() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let original = json!({
            "name": "Alice",
            "ssn": "123-45-6789",
            "age": 41,
            "score": 0.75,
            "address": {"zip": "90210", "city": "LA"}
        });
        let pii = [group(&["ssn", "age", "score", "address.zip"])];

        let mut doc = original.clone();
        cipher.encrypt_maps(&mut doc, &pii).unwrap();
        assert_eq!(doc["name"], "Alice");
        assert_eq!(doc["address"]["city"], "LA");
        assert_ne!(doc["ssn"], original["ssn"]);
        assert!(doc["age"].is_string());

        cipher.decrypt_maps(&mut doc, &pii).unwrap();
        assert_eq!(doc, original);
    }

    #[test]
    fn broadcasts_over_rows() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let original = json!([
            {"orders": [{"card": "4111"}, {"card": "5500"}]},
            {"orders": [{"card": "3782"}]}
        ]);
        let pii = [group(&["orders[].card"])];

        let plan = cipher.plan_encrypt_maps(&original, &pii).unwrap();
        assert_eq!(plan.len(), 3);

        let mut doc = original.clone();
        plan.apply(&mut doc);
        cipher.decrypt_maps(&mut doc, &pii).unwrap();
        assert_eq!(doc, original);
    }

    #[test]
    fn absent_required_path_is_not_found() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut doc = json!({"a": {"b": 1}});
        let err = cipher.decrypt_maps(&mut doc, &[group(&["a.c"])]).unwrap_err();
        assert_eq!(err, FieldCipherError::FieldNotFound { path: "a.c".into() });
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }

    #[test]
    fn absent_optional_path_is_skipped() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut doc = json!({"a": {"b": 1}});
        cipher
            .decrypt_maps(&mut doc, &[group(&["a.c"]).optional()])
            .unwrap();
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }

    #[test]
    fn null_leaves_are_left_alone() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut doc = json!({"phone": null});
        cipher.encrypt_maps(&mut doc, &[group(&["phone"])]).unwrap();
        cipher.decrypt_maps(&mut doc, &[group(&["phone"])]).unwrap();
        assert_eq!(doc, json!({"phone": null}));
    }

    #[test]
    fn non_scalar_leaf_is_unsupported() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut doc = json!({"flags": {"admin": true}});
        let err = cipher
            .encrypt_maps(&mut doc, &[group(&["flags.admin"])])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(err.to_string().contains("flags.admin"));
    }

    #[test]
    fn failure_leaves_document_untouched() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let original = json!({"ssn": "123", "bad": "not base64 !!"});
        let mut doc = original.clone();
        cipher.encrypt_maps(&mut doc, &[group(&["ssn"])]).unwrap();
        let sealed = doc.clone();

        let err = cipher
            .decrypt_maps(&mut doc, &[group(&["ssn", "bad"])])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBlob);
        assert_eq!(doc, sealed);
    }

    #[test]
    fn tampered_leaf_fails_authentication() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut doc = json!({"ssn": "123"});
        cipher.encrypt_maps(&mut doc, &[group(&["ssn"])]).unwrap();

        let mut raw = blob::from_value(&doc["ssn"]).unwrap();
        raw[NONCE_OFFSET] ^= 0x80;
        doc["ssn"] = blob::to_value(&raw);

        let err = cipher.decrypt_maps(&mut doc, &[group(&["ssn"])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    const NONCE_OFFSET: usize = crate::crypto::cipher::NONCE_LEN;

    #[test]
    fn byte_array_leaves_open_too() {
        let key = FieldKey::generate();
        let cipher = FieldCipher::new(key.clone());
        let sealed = CipherBox::aead(&key)
            .seal(&codec::encode(&Scalar::Int(1987)))
            .unwrap();
        let mut doc = json!({ "birth_year": sealed });
        cipher.decrypt_maps(&mut doc, &[group(&["birth_year"])]).unwrap();
        assert_eq!(doc, json!({"birth_year": 1987}));
    }

    #[test]
    fn block_mode_groups_round_trip() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let legacy = [group(&["ssn"]).with_mode(CipherMode::Block)];
        let mut doc = json!({"ssn": "123-45-6789"});
        cipher.encrypt_maps(&mut doc, &legacy).unwrap();
        cipher.decrypt_maps(&mut doc, &legacy).unwrap();
        assert_eq!(doc, json!({"ssn": "123-45-6789"}));
    }
}
