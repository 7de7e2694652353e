//! Dynamic-mode resolution over `serde_json::Value` trees.
//!
//! Resolution never borrows the tree mutably. It returns [`Location`]s, each
//! a list of index-based steps from the root, which the caller can read now
//! and write later.

use std::fmt;

use serde_json::Value;

use super::FieldPath;

/// One step from a node to its child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Object member by key.
    Key(String),
    /// Array element by position.
    Index(usize),
}

/// A concrete position in a JSON tree. The last step is always a
/// [`Step::Key`]: a location names a `(map, key)` slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    /// The steps from the root to this slot.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Borrow the value at this location.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.steps.iter().try_fold(root, |node, step| match step {
            Step::Key(key) => node.as_object()?.get(key),
            Step::Index(i) => node.as_array()?.get(*i),
        })
    }

    /// Mutably borrow the value at this location.
    pub fn get_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        self.steps.iter().try_fold(root, |node, step| match step {
            Step::Key(key) => node.as_object_mut()?.get_mut(key),
            Step::Index(i) => node.as_array_mut()?.get_mut(*i),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Key(key) if i == 0 => f.write_str(key)?,
                Step::Key(key) => write!(f, ".{key}")?,
                Step::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Resolve `path` against a JSON tree.
///
/// Each segment indexes an object by key. An array anywhere on the way,
/// including the root, applies the same segment to every element. A key
/// missing at any node yields zero locations for that branch.
pub fn resolve_dynamic(root: &Value, path: &FieldPath) -> Vec<Location> {
    let mut out = Vec::new();
    let mut trail = Vec::new();
    walk(root, path.segments(), &mut trail, &mut out);
    out
}

fn walk(node: &Value, segments: &[String], trail: &mut Vec<Step>, out: &mut Vec<Location>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    match node {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                trail.push(Step::Index(i));
                walk(item, segments, trail, out);
                trail.pop();
            }
        }
        Value::Object(map) => {
            if let Some(child) = map.get(segment) {
                trail.push(Step::Key(segment.clone()));
                if rest.is_empty() {
                    out.push(Location {
                        steps: trail.clone(),
                    });
                } else {
                    walk(child, rest, trail, out);
                }
                trail.pop();
            }
        }
        _ => {}
    }
}
