//! Struct driver: seal and open the [`EncryptedValue`](crate::EncryptedValue)
//! fields of a typed document.

use tracing::debug;

use super::{FieldCipher, FieldCipherError, PathGroup};
use crate::crypto::Scalar;
use crate::path::{resolve_static, Document, FieldPath, Slot};
use crate::value::Sealable;

impl FieldCipher {
    /// Seal every encrypted field named by `groups`.
    ///
    /// Paths that match nothing are skipped.
    ///
    /// # Errors
    ///
    /// - [`FieldCipherError::FieldNotEncryptable`] if a path reaches a field
    ///   that is not an encrypted value.
    /// - [`FieldCipherError::Seal`] if a field cannot be sealed, e.g. its
    ///   plaintext is still the zero value.
    /// - [`FieldCipherError::Path`] if a path is not addressable.
    ///
    /// On error no field is modified.
    pub fn encrypt_struct(
        &self,
        doc: &mut dyn Document,
        groups: &[PathGroup],
    ) -> Result<(), FieldCipherError> {
        let mut planned: Vec<Vec<Vec<u8>>> = Vec::new();
        for group in groups {
            let cipher = self.cipher_for(group);
            for path in group.paths() {
                let slots = resolve_static(doc, path)?;
                debug!(group = group.name(), path = %path, matches = slots.len(), "sealing struct path");
                let mut raws = Vec::with_capacity(slots.len());
                for slot in slots {
                    let field = sealable(slot, path)?;
                    raws.push(field.sealed_raw(&cipher).map_err(|source| {
                        FieldCipherError::Seal {
                            path: path.to_string(),
                            source,
                        }
                    })?);
                }
                planned.push(raws);
            }
        }

        let mut planned = planned.into_iter();
        for path in groups.iter().flat_map(PathGroup::paths) {
            let raws = planned.next().unwrap_or_default();
            for (slot, raw) in resolve_static(doc, path)?.into_iter().zip(raws) {
                sealable(slot, path)?.store_raw(raw);
            }
        }
        Ok(())
    }

    /// Open every encrypted field named by `groups`.
    ///
    /// Paths that match nothing are skipped.
    ///
    /// # Errors
    ///
    /// - [`FieldCipherError::FieldNotEncryptable`] if a path reaches a field
    ///   that is not an encrypted value.
    /// - [`FieldCipherError::Seal`] if a field cannot be opened: no sealed
    ///   bytes, tampered or foreign ciphertext, or a type mismatch.
    /// - [`FieldCipherError::Path`] if a path is not addressable.
    ///
    /// On error no field is modified.
    pub fn decrypt_struct(
        &self,
        doc: &mut dyn Document,
        groups: &[PathGroup],
    ) -> Result<(), FieldCipherError> {
        let mut planned: Vec<Vec<Scalar>> = Vec::new();
        for group in groups {
            let cipher = self.cipher_for(group);
            for path in group.paths() {
                let slots = resolve_static(doc, path)?;
                debug!(group = group.name(), path = %path, matches = slots.len(), "opening struct path");
                let mut values = Vec::with_capacity(slots.len());
                for slot in slots {
                    let field = sealable(slot, path)?;
                    values.push(field.opened_value(&cipher).map_err(|source| {
                        FieldCipherError::Seal {
                            path: path.to_string(),
                            source,
                        }
                    })?);
                }
                planned.push(values);
            }
        }

        let mut planned = planned.into_iter();
        for path in groups.iter().flat_map(PathGroup::paths) {
            let values = planned.next().unwrap_or_default();
            for (slot, value) in resolve_static(doc, path)?.into_iter().zip(values) {
                sealable(slot, path)?
                    .store_value(value)
                    .map_err(|source| FieldCipherError::Seal {
                        path: path.to_string(),
                        source,
                    })?;
            }
        }
        Ok(())
    }
}

fn sealable<'a>(slot: Slot<'a>, path: &FieldPath) -> Result<&'a mut dyn Sealable, FieldCipherError> {
    match slot {
        Slot::Sealed(field) => Ok(field),
        _ => Err(FieldCipherError::FieldNotEncryptable {
            path: path.to_string(),
        }),
    }
}
