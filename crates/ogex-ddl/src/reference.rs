//! Structure identities and references between structures
//!
//! A `ref` value never owns its target. It is either the null reference, a
//! symbolic key waiting for [`Document::resolve`](crate::Document::resolve),
//! or the [`StructureId`] of a structure in the same document.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::structure::Structure;

static NEXT_STRUCTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a structure, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u64);

impl StructureId {
    pub(crate) fn next() -> Self {
        Self(NEXT_STRUCTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-chosen key standing in for a structure that may not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefKey(pub String);

impl RefKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RefKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A `ref` value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Reference {
    /// Encodes as `null`
    #[default]
    Null,
    /// Symbolic key, rewritten by the resolve pass
    Deferred(RefKey),
    /// Direct structure identity
    Resolved(StructureId),
}

impl Reference {
    pub fn null() -> Self {
        Reference::Null
    }

    pub fn deferred(key: impl Into<RefKey>) -> Self {
        Reference::Deferred(key.into())
    }

    /// Reference an already built structure
    pub fn to(structure: &Structure) -> Self {
        Reference::Resolved(structure.id())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Reference::Deferred(_))
    }
}

impl From<StructureId> for Reference {
    fn from(id: StructureId) -> Self {
        Reference::Resolved(id)
    }
}

/// What the resolve pass does with a key missing from the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Rewrite to the null reference and log a warning
    #[default]
    Null,
    /// Abort with [`ogex_core::Error::Reference`]
    Error,
}

/// Index of created structures keyed by a caller-defined identity
///
/// The tree-building phase registers each shared structure (a geometry
/// object, a material) under the identity of the source object it came
/// from; nodes that refer to the same source object then share one
/// structure instead of producing duplicates.
#[derive(Debug, Default)]
pub struct StructureIndex {
    entries: HashMap<String, StructureId>,
}

impl StructureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structure; returns `false` if the key was already taken,
    /// in which case the first registration wins.
    pub fn insert(&mut self, key: impl Into<String>, structure: &Structure) -> bool {
        self.insert_id(key, structure.id())
    }

    pub fn insert_id(&mut self, key: impl Into<String>, id: StructureId) -> bool {
        match self.entries.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<StructureId> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Structure::new("A");
        let b = Structure::new("B");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_index_first_registration_wins() {
        let first = Structure::new("GeometryObject");
        let second = Structure::new("GeometryObject");

        let mut index = StructureIndex::new();
        assert!(index.insert("geometry/Cube", &first));
        assert!(!index.insert("geometry/Cube", &second));

        assert_eq!(index.get("geometry/Cube"), Some(first.id()));
        assert_eq!(index.len(), 1);
        assert!(index.get("geometry/Sphere").is_none());
    }

    #[test]
    fn test_reference_constructors() {
        let target = Structure::new("Material");
        assert_eq!(Reference::to(&target), Reference::Resolved(target.id()));
        assert!(Reference::deferred("material/Steel").is_deferred());
        assert_eq!(Reference::default(), Reference::Null);
    }
}
