//! ogex-ddl
//!
//! In-memory OpenDDL trees and their text serialization.
//!
//! Building a file is a three step protocol:
//!
//! 1. build [`Structure`]/[`Primitive`] trees into a [`Document`], using
//!    deferred [`Reference`]s for targets that do not exist yet;
//! 2. [`Document::resolve`] every deferred reference against a
//!    [`StructureIndex`], producing a [`ResolvedDocument`];
//! 3. hand the resolved document to one encoder.
//!
//! # Example
//!
//! ```rust
//! use ogex_ddl::{Document, Primitive, Structure, StructureIndex, UnresolvedPolicy};
//! use ogex_ddl::encoder::{Encoder, VerboseEncoder};
//!
//! let mut document = Document::new();
//! document.push(
//!     Structure::new("Metric")
//!         .with_property("key", "distance")
//!         .with_child(Primitive::float(vec![1.0])),
//! );
//!
//! let resolved = document
//!     .resolve(&StructureIndex::new(), UnresolvedPolicy::Null)
//!     .unwrap();
//! let text = VerboseEncoder::default().encode_to_string(&resolved).unwrap();
//! assert_eq!(text, "Metric (key = \"distance\") {float {1.0}}\n");
//! ```

pub mod data_type;
pub mod document;
pub mod encoder;
pub mod primitive;
pub mod reference;
pub mod structure;

pub use data_type::DataType;
pub use document::{Document, RefTarget, ResolvedDocument};
pub use encoder::{encode, CompressedEncoder, EncodeOptions, Encoder, EncodingMode, VerboseEncoder};
pub use primitive::{DdlString, Primitive, PrimitiveData};
pub use reference::{RefKey, Reference, StructureId, StructureIndex, UnresolvedPolicy};
pub use structure::{NameScope, Node, PropertyValue, Structure};

pub use half::f16;
