//! Static field model: how a typed document exposes its fields by name.
//!
//! Structs implement [`Document`] through `#[derive(Document)]`. Every field
//! type implements [`Field`], which reports what the resolver finds there as
//! a [`Slot`]. Wrappers (`Option`, `Box`, `Arc`) are seen through;
//! collections broadcast.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::crypto::ScalarType;
use crate::value::{EncryptedValue, Sealable};

/// A value whose fields can be looked up by name.
pub trait Document {
    /// Borrow the field called `name`, or `None` if there is no such field.
    fn field_mut(&mut self, name: &str) -> Option<Slot<'_>>;
}

/// Any value that can sit in a [`Document`] field.
pub trait Field {
    /// Describe this value to the resolver.
    fn slot(&mut self) -> Slot<'_>;
}

/// What lives at a field, as seen by path resolution.
pub enum Slot<'a> {
    /// An encrypted container; the only thing the struct driver can seal.
    Sealed(&'a mut dyn Sealable),
    /// A value with named fields of its own.
    Nested(&'a mut dyn Document),
    /// Elements of a vector or array. Remaining segments apply to each.
    Repeated(Vec<Slot<'a>>),
    /// A plain value with no fields and no sealed form.
    Plain,
    /// An empty wrapper (`None`); resolves to nothing.
    Absent,
    /// A value behind shared ownership that cannot be mutated in place.
    Shared,
}

impl std::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Sealed(s) => write!(f, "Sealed({})", s.kind()),
            Slot::Nested(_) => f.write_str("Nested"),
            Slot::Repeated(items) => write!(f, "Repeated({})", items.len()),
            Slot::Plain => f.write_str("Plain"),
            Slot::Absent => f.write_str("Absent"),
            Slot::Shared => f.write_str("Shared"),
        }
    }
}

impl<T: ScalarType> Field for EncryptedValue<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Sealed(self)
    }
}

impl<T: Field> Field for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        match self {
            Some(inner) => inner.slot(),
            None => Slot::Absent,
        }
    }
}

impl<T: Field> Field for Box<T> {
    fn slot(&mut self) -> Slot<'_> {
        (**self).slot()
    }
}

impl<T: Field> Field for Arc<T> {
    fn slot(&mut self) -> Slot<'_> {
        match Arc::get_mut(self) {
            Some(inner) => inner.slot(),
            None => Slot::Shared,
        }
    }
}

impl<T: Field> Field for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Repeated(self.iter_mut().map(Field::slot).collect())
    }
}

impl<T: Field, const N: usize> Field for [T; N] {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Repeated(self.iter_mut().map(Field::slot).collect())
    }
}

impl<T: Field> Document for HashMap<String, T> {
    fn field_mut(&mut self, name: &str) -> Option<Slot<'_>> {
        self.get_mut(name).map(Field::slot)
    }
}

impl<T: Field> Field for HashMap<String, T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Nested(self)
    }
}

impl<T: Field> Document for BTreeMap<String, T> {
    fn field_mut(&mut self, name: &str) -> Option<Slot<'_>> {
        self.get_mut(name).map(Field::slot)
    }
}

impl<T: Field> Field for BTreeMap<String, T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Nested(self)
    }
}

macro_rules! plain_fields {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Plain
                }
            }
        )*
    };
}

plain_fields!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    serde_json::Value,
);
