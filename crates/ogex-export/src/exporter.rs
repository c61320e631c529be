//! OpenGEX exporter
//!
//! Builds the whole OpenDDL tree for a scene, resolves the cross references
//! between nodes, geometry objects and materials, then hands the result to
//! the configured encoder.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use ogex_core::{Error, Result, ResultExt, Vec3};
use ogex_ddl::{
    encode, DataType, Document, EncodeOptions, Primitive, Reference, ResolvedDocument, Structure,
    StructureIndex, UnresolvedPolicy,
};
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::geometry::{build_geometry_object, GeometrySettings, VertexAttributes};
use crate::logging::instrument_phase;
use crate::scene::{SceneDescription, SceneMaterial, SceneNode};

/// Export options
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Encoder selection and float rounding
    pub encode: EncodeOptions,
    /// What to do with references whose target the scene lacks
    pub unresolved: UnresolvedPolicy,
    pub export_normals: bool,
    pub export_colors: bool,
    pub export_texcoords: bool,
    /// Elements per line in vertex and index arrays
    pub vertex_values_per_line: Option<usize>,
    /// Emit each node's scene name as a comment
    pub annotate: bool,
    /// Index array element type
    pub index_type: DataType,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            encode: EncodeOptions::default(),
            unresolved: UnresolvedPolicy::Null,
            export_normals: true,
            export_colors: true,
            export_texcoords: true,
            vertex_values_per_line: Some(8),
            annotate: false,
            index_type: DataType::UnsignedInt32,
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.vertex_values_per_line == Some(0) {
            return Err(Error::invalid_config("vertex values per line must be at least 1"));
        }
        if !self.index_type.is_unsigned_integer() {
            return Err(Error::invalid_config(format!(
                "index type must be an unsigned integer type, got {}",
                self.index_type
            )));
        }
        Ok(())
    }

    fn geometry_settings(&self) -> GeometrySettings {
        GeometrySettings {
            attributes: VertexAttributes {
                normals: self.export_normals,
                colors: self.export_colors,
                texcoords: self.export_texcoords,
            },
            values_per_line: self.vertex_values_per_line,
            index_type: self.index_type,
        }
    }
}

/// What one export wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub nodes: usize,
    pub geometry_objects: usize,
    pub materials: usize,
    /// Triangle corners read from the scene
    pub corners: usize,
    /// Vertices left after welding
    pub vertices: usize,
    pub triangles: usize,
}

/// OpenGEX exporter
pub struct OgexExporter {
    options: ExportOptions,
}

impl OgexExporter {
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Build and resolve the document for `scene` without encoding it
    pub fn build_document(&self, scene: &SceneDescription) -> Result<ResolvedDocument> {
        self.options.validate()?;
        self.prepare(scene).map(|(document, _)| document)
    }

    fn prepare(&self, scene: &SceneDescription) -> Result<(ResolvedDocument, ExportSummary)> {
        // scenes built in code skip the loader's checks
        scene.validate()?;
        let (document, index, summary) = instrument_phase("build", || self.assemble(scene))?;
        let resolved = instrument_phase("resolve", || document.resolve(&index, self.options.unresolved))?;
        Ok((resolved, summary))
    }

    fn assemble(&self, scene: &SceneDescription) -> Result<(Document, StructureIndex, ExportSummary)> {
        let mut builder = DocumentBuilder {
            options: &self.options,
            document: Document::new(),
            index: StructureIndex::new(),
            summary: ExportSummary::default(),
            meshes: Vec::new(),
            materials: Vec::new(),
        };

        builder.write_metrics(scene.scale);
        for node in &scene.nodes {
            let structure = builder.node_structure(node);
            builder.document.push(structure);
        }
        builder.write_geometry(scene)?;
        builder.write_materials(scene);

        Ok((builder.document, builder.index, builder.summary))
    }

    /// Encode `scene` into `out`
    pub fn export_to_writer(&self, scene: &SceneDescription, out: &mut dyn Write) -> Result<ExportSummary> {
        self.options.validate()?;
        let start = Instant::now();

        let (document, summary) = self.prepare(scene)?;
        instrument_phase("encode", || encode(&document, &self.options.encode, out))?;

        info!(
            nodes = summary.nodes,
            geometry_objects = summary.geometry_objects,
            materials = summary.materials,
            vertices = summary.vertices,
            duration_ms = %start.elapsed().as_millis(),
            "Export complete"
        );
        Ok(summary)
    }

    /// Encode `scene` into a new file at `path`
    pub fn export_scene(&self, scene: &SceneDescription, path: impl AsRef<Path>) -> Result<ExportSummary> {
        let path = path.as_ref();
        info!(output = %path.display(), mode = ?self.options.encode.mode, "Starting export");

        let file = File::create(path)
            .map_err(Error::from)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.export_to_writer(scene, &mut writer)
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Load a JSON or YAML scene and export it
    pub fn export_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ExportSummary> {
        let input = input.as_ref();
        let scene = SceneDescription::load(input).with_context(|| format!("loading {}", input.display()))?;
        self.export_scene(&scene, output)
    }
}

impl Default for OgexExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn geometry_key(mesh: &str) -> String {
    format!("geometry/{}", mesh)
}

fn material_key(material: &str) -> String {
    format!("material/{}", material)
}

/// Accumulates top-level structures in document order
struct DocumentBuilder<'a> {
    options: &'a ExportOptions,
    document: Document,
    index: StructureIndex,
    summary: ExportSummary,
    /// Mesh names in first-referenced order
    meshes: Vec<String>,
    /// Material names in first-referenced order
    materials: Vec<String>,
}

impl DocumentBuilder<'_> {
    fn write_metrics(&mut self, scale: f32) {
        let metric = |key: &str, value: Primitive| {
            Structure::new("Metric").with_property("key", key).with_child(value)
        };
        self.document.push(metric("distance", Primitive::float(vec![scale])));
        self.document.push(metric("angle", Primitive::float(vec![1.0])));
        self.document.push(metric("time", Primitive::float(vec![1.0])));
        self.document.push(metric("up", Primitive::string("z")));
    }

    fn node_structure(&mut self, node: &SceneNode) -> Structure {
        self.summary.nodes += 1;
        let identifier = if node.mesh.is_some() { "GeometryNode" } else { "Node" };
        let mut structure = Structure::new(identifier).with_name(format!("node{}", self.summary.nodes));
        if self.options.annotate {
            structure = structure.with_comment(node.name.as_str());
        }
        trace!(node = %node.name, identifier, "Node");

        structure.push_child(Structure::new("Name").with_child(Primitive::string(node.name.as_str())));

        if let Some(mesh) = &node.mesh {
            if !self.meshes.contains(mesh) {
                self.meshes.push(mesh.clone());
            }
            structure.push_child(
                Structure::new("ObjectRef").with_child(Primitive::reference(Reference::deferred(geometry_key(mesh)))),
            );
        }

        for (slot, material) in node.materials.iter().enumerate() {
            if !self.materials.contains(material) {
                self.materials.push(material.clone());
            }
            structure.push_child(
                Structure::new("MaterialRef")
                    .with_property("index", slot)
                    .with_child(Primitive::reference(Reference::deferred(material_key(material)))),
            );
        }

        if let Some(transform) = node.transform.filter(|t| !t.is_identity()) {
            structure.push_child(Structure::new("Transform").with_child(Primitive::vectors(&[transform.to_flat()])));
        }

        for child in &node.children {
            let child = self.node_structure(child);
            structure.push_child(child);
        }
        structure
    }

    fn write_geometry(&mut self, scene: &SceneDescription) -> Result<()> {
        let settings = self.options.geometry_settings();
        for name in &self.meshes {
            let Some(mesh) = scene.mesh(name) else {
                warn!(mesh = %name, "Node references a mesh the scene does not define");
                continue;
            };

            let label = format!("geometry{}", self.summary.geometry_objects + 1);
            let (object, stats) = build_geometry_object(mesh, &label, &settings)
                .with_context(|| format!("building geometry for mesh {:?}", name))?;

            self.index.insert(geometry_key(name), &object);
            self.document.push(object);
            self.summary.geometry_objects += 1;
            self.summary.corners += stats.corners;
            self.summary.vertices += stats.vertices;
            self.summary.triangles += stats.triangles;
        }
        Ok(())
    }

    fn write_materials(&mut self, scene: &SceneDescription) {
        for name in &self.materials {
            let Some(material) = scene.material(name) else {
                warn!(material = %name, "Node references a material the scene does not define");
                continue;
            };

            let label = format!("material{}", self.summary.materials + 1);
            let structure = material_structure(material, &label);
            self.index.insert(material_key(name), &structure);
            self.document.push(structure);
            self.summary.materials += 1;
        }
    }
}

fn material_structure(material: &SceneMaterial, label: &str) -> Structure {
    let diffuse = material.diffuse.unwrap_or(Vec3::ONE);
    Structure::new("Material")
        .with_name(label)
        .with_child(Structure::new("Name").with_child(Primitive::string(material.name.as_str())))
        .with_child(
            Structure::new("Color")
                .with_property("attrib", "diffuse")
                .with_child(Primitive::vectors(&[diffuse.to_array()])),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TriangleMesh;
    use ogex_core::Mat4x4;
    use ogex_ddl::{Encoder, PrimitiveData, VerboseEncoder};

    fn empty_scene() -> SceneDescription {
        SceneDescription::from_json_str("{}").unwrap()
    }

    #[test]
    fn test_validate_options() {
        assert!(ExportOptions::default().validate().is_ok());

        let zero = ExportOptions {
            vertex_values_per_line: Some(0),
            ..ExportOptions::default()
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidConfig { .. })));

        let float_indices = ExportOptions {
            index_type: DataType::Float,
            ..ExportOptions::default()
        };
        assert!(float_indices.validate().is_err());
    }

    #[test]
    fn test_metrics_only() {
        let document = OgexExporter::new().build_document(&empty_scene()).unwrap();
        let text = VerboseEncoder::default().encode_to_string(&document).unwrap();
        assert_eq!(
            text,
            "Metric (key = \"distance\") {float {1.0}}\n\
             Metric (key = \"angle\") {float {1.0}}\n\
             Metric (key = \"time\") {float {1.0}}\n\
             Metric (key = \"up\") {string {\"z\"}}\n"
        );
    }

    #[test]
    fn test_node_numbering_and_transform() {
        let mut scene = empty_scene();
        scene.nodes.push(SceneNode {
            name: "Root".to_string(),
            transform: Some(Mat4x4::IDENTITY),
            mesh: None,
            materials: Vec::new(),
            children: vec![SceneNode {
                name: "Offset".to_string(),
                transform: Some(Mat4x4::from_flat(&[
                    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0,
                ])),
                mesh: None,
                materials: Vec::new(),
                children: Vec::new(),
            }],
        });

        let document = OgexExporter::new().build_document(&scene).unwrap();
        let root = &document.structures()[4];
        assert_eq!(root.name.as_deref(), Some("node1"));
        assert!(root.structures().all(|s| s.identifier != "Transform"));

        let child = root.structures().find(|s| s.identifier == "Node").unwrap();
        assert_eq!(child.name.as_deref(), Some("node2"));
        let transform = child.structures().find(|s| s.identifier == "Transform").unwrap();
        let data = &transform.primitives().next().unwrap().data;
        assert!(matches!(data, PrimitiveData::Float(values) if values.len() == 16 && values[12] == 2.0));
    }

    #[test]
    fn test_annotate_comments_nodes() {
        let mut scene = empty_scene();
        scene.nodes.push(SceneNode {
            name: "Lamp".to_string(),
            transform: None,
            mesh: None,
            materials: Vec::new(),
            children: Vec::new(),
        });

        let exporter = OgexExporter::with_options(ExportOptions {
            annotate: true,
            ..ExportOptions::default()
        });
        let document = exporter.build_document(&scene).unwrap();
        assert_eq!(document.structures()[4].comment.as_deref(), Some("Lamp"));
    }

    #[test]
    fn test_missing_material_follows_policy() {
        let mut scene = empty_scene();
        scene.nodes.push(SceneNode {
            name: "Box".to_string(),
            transform: None,
            mesh: None,
            materials: vec!["Ghost".to_string()],
            children: Vec::new(),
        });

        assert!(OgexExporter::new().build_document(&scene).is_ok());

        let strict = OgexExporter::with_options(ExportOptions {
            unresolved: UnresolvedPolicy::Error,
            ..ExportOptions::default()
        });
        assert!(strict.build_document(&scene).unwrap_err().is_reference_error());
    }

    #[test]
    fn test_ragged_mesh_built_in_code_is_invalid_data() {
        let mut scene = empty_scene();
        scene.meshes.push(TriangleMesh {
            name: "Ragged".to_string(),
            positions: vec![Vec3::ZERO, Vec3::ONE, Vec3::new(0.0, 1.0, 0.0)],
            normals: Vec::new(),
            colors: None,
            texcoords0: None,
            texcoords1: None,
            material_indices: None,
            source_vertices: Some(vec![0]),
        });
        scene.nodes.push(SceneNode {
            name: "Holder".to_string(),
            transform: None,
            mesh: Some("Ragged".to_string()),
            materials: Vec::new(),
            children: Vec::new(),
        });

        let exporter = OgexExporter::new();
        let mut out = Vec::new();
        let err = exporter.export_to_writer(&scene, &mut out).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
        assert!(out.is_empty());

        assert!(matches!(exporter.build_document(&scene), Err(Error::InvalidData { .. })));
    }

    #[test]
    fn test_material_defaults_to_white() {
        let material = SceneMaterial {
            name: "Plain".to_string(),
            diffuse: None,
        };
        let structure = material_structure(&material, "material1");
        let color = structure.structures().find(|s| s.identifier == "Color").unwrap();
        assert_eq!(
            color.primitives().next().unwrap().data,
            PrimitiveData::Float(vec![1.0, 1.0, 1.0])
        );
    }
}
