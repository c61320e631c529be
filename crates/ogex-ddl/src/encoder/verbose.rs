//! Human-readable OpenDDL writer
//!
//! Layout rules:
//! - a structure with one simple primitive child, at most one property, no
//!   name and no comment collapses onto one line: `Name {string {"a"}}`
//! - everything else opens a braced block on its own lines
//! - siblings are separated by a blank line unless both are one-liners

use std::io::Write;

use ogex_core::Result;

use super::scalar::ScalarFormatter;
use super::{check_primitive, check_structure, primitive_label, Encoder};
use crate::document::ResolvedDocument;
use crate::primitive::Primitive;
use crate::structure::{Node, Structure};

const INDENT: &str = "\t";

/// Indented text encoder
#[derive(Debug, Clone)]
pub struct VerboseEncoder {
    rounding: Option<u32>,
}

impl VerboseEncoder {
    pub fn new(rounding: Option<u32>) -> Self {
        Self { rounding }
    }
}

impl Default for VerboseEncoder {
    fn default() -> Self {
        Self::new(Some(6))
    }
}

impl Encoder for VerboseEncoder {
    fn encode(&self, document: &ResolvedDocument, out: &mut dyn Write) -> Result<()> {
        let mut writer = VerboseWriter {
            values: ScalarFormatter::new(self.rounding, document),
            path: Vec::new(),
            buffer: String::new(),
        };

        let mut previous_inline = None;
        for structure in document.structures() {
            let inline = structure.renders_inline();
            if needs_blank_line(previous_inline, inline) {
                writer.buffer.push('\n');
            }
            writer.write_structure(structure, 0)?;
            out.write_all(writer.buffer.as_bytes())?;
            writer.buffer.clear();
            previous_inline = Some(inline);
        }

        out.flush()?;
        Ok(())
    }
}

fn needs_blank_line(previous_inline: Option<bool>, inline: bool) -> bool {
    matches!(previous_inline, Some(previous) if !(previous && inline))
}

struct VerboseWriter<'a> {
    values: ScalarFormatter<'a>,
    path: Vec<String>,
    buffer: String,
}

impl VerboseWriter<'_> {
    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.buffer.push_str(INDENT);
        }
    }

    fn write_comment(&mut self, comment: &Option<String>) {
        if let Some(comment) = comment {
            self.buffer.push_str(" // ");
            let mut lines = comment.lines();
            if let Some(first) = lines.next() {
                self.buffer.push_str(first);
            }
            for line in lines {
                self.buffer.push(' ');
                self.buffer.push_str(line);
            }
        }
    }

    fn write_properties(&mut self, structure: &Structure) -> Result<()> {
        if structure.properties.is_empty() {
            return Ok(());
        }

        self.buffer.push_str(" (");
        for (i, (key, value)) in structure.properties.iter().enumerate() {
            if i > 0 {
                self.buffer.push_str(", ");
            }
            self.buffer.push_str(key);
            self.buffer.push_str(" = ");
            self.values.write_property(value, &mut self.buffer)?;
        }
        self.buffer.push(')');
        Ok(())
    }

    fn write_structure(&mut self, structure: &Structure, depth: usize) -> Result<()> {
        self.path.push(structure.identifier.clone());
        check_structure(structure, &self.path)?;

        self.indent(depth);
        self.buffer.push_str(&structure.identifier);

        if structure.renders_inline() {
            self.write_properties(structure)?;
            self.buffer.push_str(" {");
            if let Some(primitive) = structure.primitives().next() {
                self.write_inline_primitive(primitive)?;
            }
            self.buffer.push_str("}\n");
        } else {
            if let Some(name) = &structure.name {
                self.buffer.push(' ');
                self.buffer.push(structure.scope.sigil());
                self.buffer.push_str(name);
            }
            self.write_properties(structure)?;
            self.write_comment(&structure.comment);
            self.buffer.push('\n');

            self.indent(depth);
            self.buffer.push_str("{\n");
            self.write_children(&structure.children, depth + 1)?;
            self.indent(depth);
            self.buffer.push_str("}\n");
        }

        self.path.pop();
        Ok(())
    }

    fn write_children(&mut self, children: &[Node], depth: usize) -> Result<()> {
        let mut previous_inline = None;
        for child in children {
            let inline = child.renders_inline();
            if needs_blank_line(previous_inline, inline) {
                self.buffer.push('\n');
            }
            match child {
                Node::Structure(structure) => self.write_structure(structure, depth)?,
                Node::Primitive(primitive) => self.write_primitive(primitive, depth)?,
            }
            previous_inline = Some(inline);
        }
        Ok(())
    }

    fn write_primitive_header(&mut self, primitive: &Primitive) {
        self.buffer.push_str(primitive.data_type().name());
        if primitive.vector_size > 0 {
            self.buffer.push('[');
            self.buffer.push_str(&primitive.vector_size.to_string());
            self.buffer.push(']');
        }
        if let Some(name) = &primitive.name {
            self.buffer.push(' ');
            self.buffer.push(primitive.scope.sigil());
            self.buffer.push_str(name);
        }
    }

    /// `type {value}` without indentation or newline
    fn write_inline_primitive(&mut self, primitive: &Primitive) -> Result<()> {
        self.path.push(primitive_label(primitive));
        let count = check_primitive(primitive, &self.path)?;

        self.write_primitive_header(primitive);
        if count == 0 {
            self.buffer.push_str(" { }");
        } else {
            self.buffer.push_str(" {");
            self.write_elements(primitive, count, None, 0)?;
            self.buffer.push('}');
        }

        self.path.pop();
        Ok(())
    }

    fn write_primitive(&mut self, primitive: &Primitive, depth: usize) -> Result<()> {
        if primitive.renders_inline() {
            self.indent(depth);
            self.write_inline_primitive(primitive)?;
            self.buffer.push('\n');
            return Ok(());
        }

        self.path.push(primitive_label(primitive));
        let count = check_primitive(primitive, &self.path)?;

        self.indent(depth);
        self.write_primitive_header(primitive);
        self.write_comment(&primitive.comment);
        self.buffer.push('\n');

        self.indent(depth);
        self.buffer.push_str("{\n");
        if count > 0 {
            self.indent(depth + 1);
            self.write_elements(primitive, count, primitive.max_elements_per_line, depth + 1)?;
            self.buffer.push('\n');
        }
        self.indent(depth);
        self.buffer.push_str("}\n");

        self.path.pop();
        Ok(())
    }

    /// Elements separated by `, `, wrapping after every `per_line` elements
    fn write_elements(
        &mut self,
        primitive: &Primitive,
        count: usize,
        per_line: Option<usize>,
        depth: usize,
    ) -> Result<()> {
        for element in 0..count {
            if element > 0 {
                match per_line {
                    Some(n) if element % n == 0 => {
                        self.buffer.push_str(",\n");
                        self.indent(depth);
                    }
                    _ => self.buffer.push_str(", "),
                }
            }
            self.values.write_element(
                &primitive.data,
                primitive.vector_size,
                element,
                ", ",
                &mut self.buffer,
            )?;
        }
        Ok(())
    }
}
