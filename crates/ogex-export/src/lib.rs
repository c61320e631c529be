//! OpenGEX exporter
//!
//! Turns a [`SceneDescription`] into an OpenGEX document:
//!
//! 1. per-corner mesh attributes are welded into shared vertex arrays
//! 2. nodes, geometry objects and materials are assembled into an OpenDDL
//!    tree, cross-linked through deferred references
//! 3. references are resolved and the document is written by the verbose or
//!    compressed encoder
//!
//! ```no_run
//! use ogex_export::{ExportOptions, OgexExporter};
//!
//! let exporter = OgexExporter::with_options(ExportOptions::default());
//! let summary = exporter.export_file("scene.json", "scene.ogex")?;
//! println!("{} vertices written", summary.vertices);
//! # Ok::<(), ogex_core::Error>(())
//! ```

pub mod exporter;
pub mod geometry;
pub mod logging;
pub mod scene;
pub mod weld;

pub use exporter::{ExportOptions, ExportSummary, OgexExporter};
pub use geometry::{build_geometry_object, inspect_mesh, GeometrySettings, GeometryStats, MeshReport, VertexAttributes};
pub use scene::{SceneDescription, SceneMaterial, SceneNode, TriangleMesh};
pub use weld::{bucket_count, weld, ExportVertex, WeldedMesh};
