//! OpenDDL text encoders
//!
//! Two layout policies over one data model:
//! - [`VerboseEncoder`]: indented, human-readable, collapses simple structures
//! - [`CompressedEncoder`]: no whitespace at all
//!
//! Trees are not validated while they are built; the encoders check every
//! node as they reach it and abort with [`Error::Build`] naming its path.

mod compressed;
pub mod scalar;
mod verbose;

pub use compressed::CompressedEncoder;
pub use verbose::VerboseEncoder;

use std::io::Write;

use ogex_core::{Error, Result};

use crate::document::{join_path, ResolvedDocument};
use crate::primitive::Primitive;
use crate::structure::Structure;

/// Which encoder writes the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingMode {
    #[default]
    Verbose,
    Compressed,
}

/// Text formatting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub mode: EncodingMode,
    /// Decimal places for half/float/double values, `None` for shortest exact
    pub rounding: Option<u32>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            mode: EncodingMode::Verbose,
            rounding: Some(6),
        }
    }
}

/// A serializer for resolved documents
pub trait Encoder {
    /// Write the whole document in one top-down pass
    fn encode(&self, document: &ResolvedDocument, out: &mut dyn Write) -> Result<()>;

    fn encode_to_string(&self, document: &ResolvedDocument) -> Result<String> {
        let mut buffer = Vec::new();
        self.encode(document, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::invalid_data(e.to_string()))
    }
}

/// Encode with the encoder selected by `options.mode`
pub fn encode(document: &ResolvedDocument, options: &EncodeOptions, out: &mut dyn Write) -> Result<()> {
    match options.mode {
        EncodingMode::Verbose => VerboseEncoder::new(options.rounding).encode(document, out),
        EncodingMode::Compressed => CompressedEncoder::new(options.rounding).encode(document, out),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(kind: &str, text: &str, path: &[String]) -> Result<()> {
    if is_identifier(text) {
        Ok(())
    } else {
        Err(Error::build(join_path(path), format!("invalid {} {:?}", kind, text)))
    }
}

/// Validate the header of a structure; `path` already ends with it
pub(crate) fn check_structure(structure: &Structure, path: &[String]) -> Result<()> {
    check_identifier("identifier", &structure.identifier, path)?;
    if let Some(name) = &structure.name {
        check_identifier("name", name, path)?;
    }
    for (key, _) in &structure.properties {
        check_identifier("property key", key, path)?;
    }
    Ok(())
}

/// Path segment for a primitive, e.g. `float[3]`
pub(crate) fn primitive_label(primitive: &Primitive) -> String {
    match primitive.vector_size {
        0 => primitive.data_type().name().to_string(),
        width => format!("{}[{}]", primitive.data_type().name(), width),
    }
}

/// Validate a primitive and return its element count
pub(crate) fn check_primitive(primitive: &Primitive, path: &[String]) -> Result<usize> {
    let count = primitive.element_count().ok_or_else(|| {
        Error::build(
            join_path(path),
            format!(
                "{} values do not divide into vectors of {}",
                primitive.data.len(),
                primitive.vector_size
            ),
        )
    })?;

    if primitive.max_elements_per_line == Some(0) {
        return Err(Error::build(join_path(path), "max_elements_per_line must be positive"));
    }
    if let Some(name) = &primitive.name {
        check_identifier("name", name, path)?;
    }
    Ok(count)
}
