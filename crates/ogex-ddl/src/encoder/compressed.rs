//! Whitespace-free OpenDDL writer
//!
//! Same tree and values as the verbose form, without indentation, blank
//! lines or spaces around delimiters. Comments are dropped since a line
//! comment cannot end without a line break.

use std::io::Write;

use ogex_core::Result;

use super::scalar::ScalarFormatter;
use super::{check_primitive, check_structure, primitive_label, Encoder};
use crate::document::ResolvedDocument;
use crate::primitive::Primitive;
use crate::structure::{Node, Structure};

/// Minimal-size text encoder
#[derive(Debug, Clone)]
pub struct CompressedEncoder {
    rounding: Option<u32>,
}

impl CompressedEncoder {
    pub fn new(rounding: Option<u32>) -> Self {
        Self { rounding }
    }
}

impl Default for CompressedEncoder {
    fn default() -> Self {
        Self::new(Some(6))
    }
}

impl Encoder for CompressedEncoder {
    fn encode(&self, document: &ResolvedDocument, out: &mut dyn Write) -> Result<()> {
        let values = ScalarFormatter::new(self.rounding, document);
        let mut path = Vec::new();
        let mut buffer = String::new();

        for structure in document.structures() {
            write_structure(&values, structure, &mut path, &mut buffer)?;
            out.write_all(buffer.as_bytes())?;
            buffer.clear();
        }

        out.flush()?;
        Ok(())
    }
}

fn write_structure(
    values: &ScalarFormatter<'_>,
    structure: &Structure,
    path: &mut Vec<String>,
    buffer: &mut String,
) -> Result<()> {
    path.push(structure.identifier.clone());
    check_structure(structure, path)?;

    buffer.push_str(&structure.identifier);
    if let Some(name) = &structure.name {
        buffer.push(structure.scope.sigil());
        buffer.push_str(name);
    }

    if !structure.properties.is_empty() {
        buffer.push('(');
        for (i, (key, value)) in structure.properties.iter().enumerate() {
            if i > 0 {
                buffer.push(',');
            }
            buffer.push_str(key);
            buffer.push('=');
            values.write_property(value, buffer)?;
        }
        buffer.push(')');
    }

    buffer.push('{');
    for child in &structure.children {
        match child {
            Node::Structure(child) => write_structure(values, child, path, buffer)?,
            Node::Primitive(primitive) => write_primitive(values, primitive, path, buffer)?,
        }
    }
    buffer.push('}');

    path.pop();
    Ok(())
}

fn write_primitive(
    values: &ScalarFormatter<'_>,
    primitive: &Primitive,
    path: &mut Vec<String>,
    buffer: &mut String,
) -> Result<()> {
    path.push(primitive_label(primitive));
    let count = check_primitive(primitive, path)?;

    buffer.push_str(primitive.data_type().name());
    if primitive.vector_size > 0 {
        buffer.push('[');
        buffer.push_str(&primitive.vector_size.to_string());
        buffer.push(']');
    }
    if let Some(name) = &primitive.name {
        buffer.push(primitive.scope.sigil());
        buffer.push_str(name);
    }

    buffer.push('{');
    for element in 0..count {
        if element > 0 {
            buffer.push(',');
        }
        values.write_element(&primitive.data, primitive.vector_size, element, ",", buffer)?;
    }
    buffer.push('}');

    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::reference::{StructureIndex, UnresolvedPolicy};

    fn encode(document: Document) -> String {
        let resolved = document
            .resolve(&StructureIndex::new(), UnresolvedPolicy::Null)
            .unwrap();
        CompressedEncoder::default().encode_to_string(&resolved).unwrap()
    }

    #[test]
    fn test_metric() {
        let document = Document::new().with_structure(
            Structure::new("Metric")
                .with_property("key", "distance")
                .with_child(Primitive::float(vec![1.0])),
        );
        assert_eq!(encode(document), "Metric(key=\"distance\"){float{1.0}}");
    }

    #[test]
    fn test_nested_vectors_and_names() {
        let document = Document::new().with_structure(
            Structure::new("GeometryObject")
                .with_name("geometry1")
                .with_comment("dropped")
                .with_child(
                    Structure::new("VertexArray")
                        .with_property("attrib", "position")
                        .with_child(
                            Primitive::vectors(&[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0]])
                                .with_max_elements_per_line(1),
                        ),
                ),
        );
        assert_eq!(
            encode(document),
            "GeometryObject$geometry1{VertexArray(attrib=\"position\"){float[3]{{0.0,0.0,0.0},{1.0,0.0,0.0}}}}"
        );
    }

    #[test]
    fn test_siblings_concatenate() {
        let document = Document::new()
            .with_structure(Structure::new("A").with_child(Primitive::boolean(true)))
            .with_structure(Structure::new("B").with_child(Primitive::float(vec![])));
        assert_eq!(encode(document), "A{bool{true}}B{float{}}");
    }
}
