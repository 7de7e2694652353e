//! Static-mode resolution: walk a typed [`Document`] by field name.

use super::fields::{Document, Slot};
use super::{FieldPath, PathError};

/// Resolve `path` against `root`, returning every leaf slot it reaches.
///
/// The returned slots are never [`Slot::Repeated`], [`Slot::Absent`] or
/// [`Slot::Shared`]: repetition is flattened, absence contributes nothing,
/// and shared ownership is an error. Whether a leaf can actually be sealed is
/// for the caller to decide.
///
/// Unknown field names, `None` wrappers and paths that continue past a
/// scalar all yield zero matches rather than errors.
///
/// # Errors
///
/// Returns [`PathError::NotAddressable`] if the path crosses or ends at a
/// value behind an `Arc` with other owners.
pub fn resolve_static<'a>(
    root: &'a mut dyn Document,
    path: &FieldPath,
) -> Result<Vec<Slot<'a>>, PathError> {
    let mut out = Vec::new();
    let segments = path.segments();
    if let Some((first, rest)) = segments.split_first() {
        if let Some(slot) = root.field_mut(first) {
            descend(slot, rest, path, &mut out)?;
        }
    }
    Ok(out)
}

fn descend<'a>(
    slot: Slot<'a>,
    rest: &[String],
    path: &FieldPath,
    out: &mut Vec<Slot<'a>>,
) -> Result<(), PathError> {
    match slot {
        Slot::Repeated(items) => {
            for item in items {
                descend(item, rest, path, out)?;
            }
        }
        Slot::Absent => {}
        Slot::Shared => return Err(PathError::NotAddressable(path.to_string())),
        leaf if rest.is_empty() => out.push(leaf),
        Slot::Nested(doc) => {
            if let Some(child) = doc.field_mut(&rest[0]) {
                descend(child, &rest[1..], path, out)?;
            }
        }
        Slot::Sealed(_) | Slot::Plain => {}
    }
    Ok(())
}
