//! Selective field encryption for structured records.
//!
//! Individual scalar fields of a document are sealed with a single symmetric
//! key while the rest of the document stays readable. Two document shapes are
//! supported:
//!
//! - **Typed structs** whose sensitive fields are [`EncryptedValue`]s and which
//!   derive [`Document`]. Sealing fills each container's `raw` bytes; the
//!   plaintext stays in place.
//! - **JSON trees** ([`serde_json::Value`]) whose sensitive leaves are plain
//!   strings or numbers. Sealing replaces each leaf with the base64 text of
//!   its blob.
//!
//! Fields are chosen by [`PathGroup`]s of dot paths such as
//! `"companies.position"`, where repeated values broadcast to every element.
//!
//! ```ignore
//! use fieldcrypt::{Document, EncryptedValue, FieldCipher, FieldKey, PathGroup};
//!
//! #[derive(Document)]
//! struct Company {
//!     name: String,
//!     position: EncryptedValue<String>,
//! }
//!
//! let cipher = FieldCipher::new(FieldKey::generate());
//! let groups = [PathGroup::new("employment", ["position"])?];
//! let mut company = Company { name: "Acme".into(), position: "Engineer".to_string().into() };
//! cipher.encrypt_struct(&mut company, &groups)?;
//! assert!(company.position.is_sealed());
//! ```

// Lets `#[derive(Document)]` expand to `::fieldcrypt::...` inside this crate too.
extern crate self as fieldcrypt;

pub mod blob;
pub mod crypto;
pub mod driver;
pub mod path;
pub mod value;

pub use crypto::{CipherBox, CipherMode, FieldKey, KeyError, Scalar, ScalarKind, ScalarType};
pub use driver::{ErrorKind, FieldCipher, FieldCipherError, PathGroup, Presence};
pub use path::{Document, Field, FieldPath, Slot};
pub use value::{EncryptedValue, SealError, Sealable};

pub use fieldcrypt_derive::Document;
