//! Dot-path resolution over static structs and dynamic JSON trees.
//!
//! # Path syntax
//!
//! `"companies.position"`: segments separated by `.`. Repeated values
//! (vectors, arrays, JSON arrays) are crossed implicitly: the remaining
//! segments apply to every element. A trailing `[]` on a segment
//! (`"orders[].card_number"`) is accepted and means the same thing.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** Resolution only finds locations; sealing is
//!   the driver's job.
//! - A path may match zero, one or many locations. Zero is not an error here.

pub mod fields;
pub mod maps;
pub mod structs;

pub use fields::{Document, Field, Slot};
pub use maps::{resolve_dynamic, Location, Step};
pub use structs::resolve_static;

use std::fmt;

use thiserror::Error;

/// Errors produced while parsing or resolving a field path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path is empty or contains an empty segment.
    #[error("invalid field path: {0:?}")]
    InvalidPath(String),

    /// The path reaches a value that cannot be mutated in place, such as the
    /// contents of an `Arc` with other owners.
    #[error("field {0} is not addressable")]
    NotAddressable(String),
}

/// A parsed, validated dot-separated field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse `path` into its segments.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidPath`] for an empty path or an empty
    /// segment (`"a..b"`, `".a"`, `"a."`, `"[]"`).
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = path
            .split('.')
            .map(|part| part.strip_suffix("[]").unwrap_or(part).to_owned())
            .collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::InvalidPath(path.to_owned()));
        }
        Ok(Self {
            raw: path.to_owned(),
            segments,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The segments, with any `[]` suffixes removed.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
