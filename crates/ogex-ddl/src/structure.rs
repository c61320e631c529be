//! Structures: identified tree nodes with properties and ordered children

use crate::data_type::DataType;
use crate::primitive::{DdlString, Primitive};
use crate::reference::{Reference, StructureId};

/// Visibility of a structure or primitive name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameScope {
    /// `$name`, visible document-wide
    #[default]
    Global,
    /// `%name`, visible inside the enclosing structure
    Local,
}

impl NameScope {
    pub fn sigil(self) -> char {
        match self {
            NameScope::Global => '$',
            NameScope::Local => '%',
        }
    }
}

/// A property value, typed when it is set
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    UnsignedInt(u64),
    Float(f64),
    String(DdlString),
    Ref(Reference),
    Type(DataType),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::UnsignedInt(value as u64)
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::UnsignedInt(value)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::UnsignedInt(value as u64)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Float(value as f64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(DdlString::new(value))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(DdlString::new(value))
    }
}

impl From<DdlString> for PropertyValue {
    fn from(value: DdlString) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Reference> for PropertyValue {
    fn from(value: Reference) -> Self {
        PropertyValue::Ref(value)
    }
}

impl From<DataType> for PropertyValue {
    fn from(value: DataType) -> Self {
        PropertyValue::Type(value)
    }
}

/// A child of a structure
#[derive(Debug)]
pub enum Node {
    Structure(Structure),
    Primitive(Primitive),
}

impl Node {
    /// Whether the verbose encoder writes this node on one line
    pub fn renders_inline(&self) -> bool {
        match self {
            Node::Structure(structure) => structure.renders_inline(),
            Node::Primitive(primitive) => primitive.renders_inline(),
        }
    }
}

impl From<Structure> for Node {
    fn from(structure: Structure) -> Self {
        Node::Structure(structure)
    }
}

impl From<Primitive> for Node {
    fn from(primitive: Primitive) -> Self {
        Node::Primitive(primitive)
    }
}

/// An OpenDDL structure
///
/// Structures own their children exclusively. They are deliberately not
/// `Clone`: the [`StructureId`] handed out at construction is what
/// references point at, and a copy would share it.
#[derive(Debug)]
pub struct Structure {
    id: StructureId,
    pub identifier: String,
    pub name: Option<String>,
    pub scope: NameScope,
    pub properties: Vec<(String, PropertyValue)>,
    pub children: Vec<Node>,
    pub comment: Option<String>,
}

impl Structure {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: StructureId::next(),
            identifier: identifier.into(),
            name: None,
            scope: NameScope::Global,
            properties: Vec::new(),
            children: Vec::new(),
            comment: None,
        }
    }

    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.scope = NameScope::Global;
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.scope = NameScope::Local;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set a property, replacing an existing value in place
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn push_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Child structures in order
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.children.iter().filter_map(|child| match child {
            Node::Structure(structure) => Some(structure),
            Node::Primitive(_) => None,
        })
    }

    /// Child primitives in order
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.children.iter().filter_map(|child| match child {
            Node::Primitive(primitive) => Some(primitive),
            Node::Structure(_) => None,
        })
    }

    /// One simple primitive child, at most one property, no name
    pub fn is_simple(&self) -> bool {
        self.name.is_none()
            && self.properties.len() <= 1
            && matches!(self.children.as_slice(), [Node::Primitive(p)] if p.is_simple())
    }

    /// Whether the verbose encoder collapses this structure onto one line
    pub fn renders_inline(&self) -> bool {
        self.is_simple()
            && self.comment.is_none()
            && self.primitives().all(Primitive::renders_inline)
    }
}
