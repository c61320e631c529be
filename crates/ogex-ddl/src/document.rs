//! Documents and the reference resolution pass

use std::collections::HashMap;

use ogex_core::{Error, Result};
use tracing::{debug, warn};

use crate::reference::{Reference, StructureId, StructureIndex, UnresolvedPolicy};
use crate::structure::{NameScope, Node, PropertyValue, Structure};

/// Ordered top-level structures, the serialization root
#[derive(Debug, Default)]
pub struct Document {
    structures: Vec<Structure>,
}

/// Name under which a reference target is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    pub name: String,
    pub scope: NameScope,
}

/// A document whose references all point at structures inside it
///
/// Only this type can be encoded, so nothing is written before every
/// deferred reference has been resolved.
#[derive(Debug)]
pub struct ResolvedDocument {
    document: Document,
    targets: HashMap<StructureId, RefTarget>,
}

#[derive(Debug, Default)]
struct ResolveStats {
    resolved: usize,
    nulled: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, structure: Structure) {
        self.structures.push(structure);
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.push(structure);
        self
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Find a structure anywhere in the tree
    pub fn find(&self, id: StructureId) -> Option<&Structure> {
        fn search(structure: &Structure, id: StructureId) -> Option<&Structure> {
            if structure.id() == id {
                return Some(structure);
            }
            structure.structures().find_map(|child| search(child, id))
        }
        self.structures.iter().find_map(|structure| search(structure, id))
    }

    /// Rewrite every deferred reference through `index`
    ///
    /// Keys missing from the index follow `policy`. Afterwards every
    /// resolved reference must name a structure of this document that has
    /// a name to write; anything else aborts.
    pub fn resolve(
        mut self,
        index: &StructureIndex,
        policy: UnresolvedPolicy,
    ) -> Result<ResolvedDocument> {
        let mut stats = ResolveStats::default();
        let mut path = Vec::new();
        for structure in &mut self.structures {
            rewrite_structure(structure, index, policy, &mut path, &mut stats)?;
        }

        let mut present = HashMap::new();
        for structure in &self.structures {
            collect_targets(structure, &mut present);
        }

        for structure in &self.structures {
            check_structure(structure, &present, &mut path)?;
        }

        debug!(
            resolved = stats.resolved,
            nulled = stats.nulled,
            structures = present.len(),
            "Resolved document references"
        );

        let targets = present
            .into_iter()
            .filter_map(|(id, target)| target.map(|target| (id, target)))
            .collect();

        Ok(ResolvedDocument {
            document: self,
            targets,
        })
    }
}

impl ResolvedDocument {
    pub fn structures(&self) -> &[Structure] {
        self.document.structures()
    }

    /// Name a resolved reference is written with
    pub fn target(&self, id: StructureId) -> Option<&RefTarget> {
        self.targets.get(&id)
    }

    pub fn find(&self, id: StructureId) -> Option<&Structure> {
        self.document.find(id)
    }
}

pub(crate) fn join_path(path: &[String]) -> String {
    path.join("/")
}

fn rewrite_reference(
    reference: &mut Reference,
    index: &StructureIndex,
    policy: UnresolvedPolicy,
    path: &[String],
    stats: &mut ResolveStats,
) -> Result<()> {
    let Reference::Deferred(key) = reference else {
        return Ok(());
    };

    match index.get(key.as_str()) {
        Some(id) => {
            *reference = Reference::Resolved(id);
            stats.resolved += 1;
        }
        None => match policy {
            UnresolvedPolicy::Null => {
                warn!(key = %key, path = %join_path(path), "Unresolved reference written as null");
                *reference = Reference::Null;
                stats.nulled += 1;
            }
            UnresolvedPolicy::Error => {
                return Err(Error::reference(key.as_str())
                    .with_context(format!("resolving {}", join_path(path))));
            }
        },
    }
    Ok(())
}

fn rewrite_structure(
    structure: &mut Structure,
    index: &StructureIndex,
    policy: UnresolvedPolicy,
    path: &mut Vec<String>,
    stats: &mut ResolveStats,
) -> Result<()> {
    path.push(structure.identifier.clone());

    for (_, value) in &mut structure.properties {
        if let PropertyValue::Ref(reference) = value {
            rewrite_reference(reference, index, policy, path, stats)?;
        }
    }

    for child in &mut structure.children {
        match child {
            Node::Structure(child) => rewrite_structure(child, index, policy, path, stats)?,
            Node::Primitive(primitive) => {
                if let Some(references) = primitive.references_mut() {
                    for reference in references {
                        rewrite_reference(reference, index, policy, path, stats)?;
                    }
                }
            }
        }
    }

    path.pop();
    Ok(())
}

fn collect_targets(structure: &Structure, present: &mut HashMap<StructureId, Option<RefTarget>>) {
    let target = structure.name.as_ref().map(|name| RefTarget {
        name: name.clone(),
        scope: structure.scope,
    });
    present.insert(structure.id(), target);

    for child in structure.structures() {
        collect_targets(child, present);
    }
}

fn check_reference(
    reference: &Reference,
    present: &HashMap<StructureId, Option<RefTarget>>,
    path: &[String],
) -> Result<()> {
    match reference {
        Reference::Null => Ok(()),
        Reference::Deferred(key) => Err(Error::reference(key.as_str())),
        Reference::Resolved(id) => match present.get(id) {
            None => Err(Error::DanglingReference { target: id.value() }
                .with_context(format!("resolving {}", join_path(path)))),
            Some(None) => Err(Error::build(
                join_path(path),
                format!("reference target {} has no name", id),
            )),
            Some(Some(_)) => Ok(()),
        },
    }
}

fn check_structure(
    structure: &Structure,
    present: &HashMap<StructureId, Option<RefTarget>>,
    path: &mut Vec<String>,
) -> Result<()> {
    path.push(structure.identifier.clone());

    for (_, value) in &structure.properties {
        if let PropertyValue::Ref(reference) = value {
            check_reference(reference, present, path)?;
        }
    }

    for child in &structure.children {
        match child {
            Node::Structure(child) => check_structure(child, present, path)?,
            Node::Primitive(primitive) => {
                if let crate::primitive::PrimitiveData::Ref(references) = &primitive.data {
                    for reference in references {
                        check_reference(reference, present, path)?;
                    }
                }
            }
        }
    }

    path.pop();
    Ok(())
}
