//! Scene description input
//!
//! A host application hands the exporter a flattened, triangulated scene:
//! a node hierarchy, meshes given as per-corner attribute streams, and
//! materials. On disk it is JSON or YAML:
//!
//! ```yaml
//! scale: 1.0
//! nodes:
//!   - name: Cube
//!     mesh: CubeMesh
//!     materials: [Steel]
//! meshes:
//!   - name: CubeMesh
//!     positions: [[0, 0, 0], [1, 0, 0], [0, 1, 0]]
//!     normals:   [[0, 0, 1], [0, 0, 1], [0, 0, 1]]
//! materials:
//!   - name: Steel
//!     diffuse: [0.6, 0.6, 0.6]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ogex_core::{Error, Mat4x4, Result, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::VertexAttributes;
use crate::weld::ExportVertex;

fn default_scale() -> f32 {
    1.0
}

/// Root of a scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Length of one scene unit in meters
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub meshes: Vec<TriangleMesh>,
    #[serde(default)]
    pub materials: Vec<SceneMaterial>,
}

/// A node of the scene hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// Local transform, column-major
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Mat4x4>,
    /// Name of the mesh this node instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    /// Material names by slot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

/// Triangulated mesh, one entry per triangle corner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texcoords0: Option<Vec<Vec2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texcoords1: Option<Vec<Vec2>>,
    /// Material slot per triangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_indices: Option<Vec<u32>>,
    /// Source vertex index per corner; defaults to the corner index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_vertices: Option<Vec<u32>>,
}

/// A material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMaterial {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse: Option<Vec3>,
}

impl SceneDescription {
    /// Load a scene from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let reader = BufReader::new(File::open(path)?);
        let scene: SceneDescription = match extension.as_str() {
            "json" => serde_json::from_reader(reader)?,
            "yaml" | "yml" => serde_yaml::from_reader(reader)?,
            other => {
                return Err(Error::UnsupportedFormat {
                    format: other.to_string(),
                })
            }
        };

        scene.validate()?;
        Ok(scene)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let scene: SceneDescription = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scene: SceneDescription = serde_yaml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check every mesh's attribute streams
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::invalid_data(format!("scale must be positive, got {}", self.scale)));
        }
        for mesh in &self.meshes {
            mesh.validate()?;
        }
        Ok(())
    }

    pub fn mesh(&self, name: &str) -> Option<&TriangleMesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn material(&self, name: &str) -> Option<&SceneMaterial> {
        self.materials.iter().find(|material| material.name == name)
    }

    /// Total number of nodes in the hierarchy
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[SceneNode]) -> usize {
            nodes.iter().map(|node| 1 + count(&node.children)).sum()
        }
        count(&self.nodes)
    }
}

impl TriangleMesh {
    pub fn corner_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn validate(&self) -> Result<()> {
        let corners = self.positions.len();
        if corners % 3 != 0 {
            return Err(self.invalid(format!("{} corners is not a whole number of triangles", corners)));
        }

        let streams = [
            ("normals", Some(self.normals.len())),
            ("colors", self.colors.as_ref().map(Vec::len)),
            ("texcoords0", self.texcoords0.as_ref().map(Vec::len)),
            ("texcoords1", self.texcoords1.as_ref().map(Vec::len)),
            ("source_vertices", self.source_vertices.as_ref().map(Vec::len)),
        ];
        for (stream, len) in streams {
            if let Some(len) = len {
                if len != corners {
                    return Err(self.invalid(format!("{} has {} entries, expected {}", stream, len, corners)));
                }
            }
        }

        if let Some(materials) = &self.material_indices {
            if materials.len() != self.triangle_count() {
                return Err(self.invalid(format!(
                    "material_indices has {} entries, expected {}",
                    materials.len(),
                    self.triangle_count()
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> Error {
        Error::invalid_data(format!("mesh {:?}: {}", self.name, message))
    }

    /// Material slot per triangle, all zero when absent
    pub fn materials_per_triangle(&self) -> Vec<u32> {
        self.material_indices
            .clone()
            .unwrap_or_else(|| vec![0; self.triangle_count()])
    }

    /// One export vertex per corner; disabled streams keep their defaults
    pub fn corners(&self, attributes: VertexAttributes) -> Vec<ExportVertex> {
        (0..self.positions.len())
            .map(|corner| {
                let normal = if attributes.normals {
                    self.normals[corner]
                } else {
                    Vec3::ZERO
                };
                let source_vertex = self
                    .source_vertices
                    .as_ref()
                    .map_or(corner as u32, |sources| sources[corner]);

                let mut vertex = ExportVertex::new(self.positions[corner], normal)
                    .with_source(source_vertex, (corner / 3) as u32);
                if attributes.colors {
                    if let Some(colors) = &self.colors {
                        vertex = vertex.with_color(colors[corner]);
                    }
                }
                if attributes.texcoords {
                    if let Some(uvs) = &self.texcoords0 {
                        vertex = vertex.with_texcoord0(uvs[corner]);
                    }
                    if let Some(uvs) = &self.texcoords1 {
                        vertex = vertex.with_texcoord1(uvs[corner]);
                    }
                }
                vertex
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_JSON: &str = r#"{
        "nodes": [
            {"name": "Root", "children": [{"name": "Cube", "mesh": "CubeMesh", "materials": ["Steel"]}]}
        ],
        "meshes": [{
            "name": "CubeMesh",
            "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
            "normals": [[0, 0, 1], [0, 0, 1], [0, 0, 1]],
            "texcoords0": [[0, 0], [1, 0], [0, 1]]
        }],
        "materials": [{"name": "Steel", "diffuse": [0.5, 0.5, 0.5]}]
    }"#;

    #[test]
    fn test_parse_json() {
        let scene = SceneDescription::from_json_str(SCENE_JSON).unwrap();
        assert_eq!(scene.scale, 1.0);
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.mesh("CubeMesh").unwrap().triangle_count(), 1);
        assert_eq!(scene.material("Steel").unwrap().diffuse, Some(Vec3::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "
scale: 0.01
nodes:
  - name: Lamp
    transform: [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 5, 0, 0, 1]
";
        let scene = SceneDescription::from_yaml_str(yaml).unwrap();
        assert_eq!(scene.scale, 0.01);
        let transform = scene.nodes[0].transform.unwrap();
        assert_eq!(transform.translation(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_ragged_streams_rejected() {
        let json = r#"{"meshes": [{
            "name": "Broken",
            "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
            "normals": [[0, 0, 1]]
        }]}"#;
        let err = SceneDescription::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("normals has 1 entries"));
    }

    #[test]
    fn test_partial_triangle_rejected() {
        let json = r#"{"meshes": [{"name": "Two", "positions": [[0, 0, 0], [1, 0, 0]], "normals": [[0, 0, 1], [0, 0, 1]]}]}"#;
        assert!(SceneDescription::from_json_str(json).is_err());
    }

    #[test]
    fn test_corners_respect_attribute_selection() {
        let scene = SceneDescription::from_json_str(SCENE_JSON).unwrap();
        let mesh = scene.mesh("CubeMesh").unwrap();

        let all = mesh.corners(VertexAttributes::default());
        assert_eq!(all[1].texcoord0, Vec2::new(1.0, 0.0));
        assert_eq!(all[1].color, Vec3::ONE);
        assert_eq!(all[2].source_vertex, 2);

        let bare = mesh.corners(VertexAttributes {
            normals: false,
            colors: false,
            texcoords: false,
        });
        assert_eq!(bare[1].texcoord0, Vec2::ZERO);
        assert_eq!(bare[1].normal, Vec3::ZERO);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "").unwrap();

        let err = SceneDescription::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { ref format } if format == "toml"));

        let missing = SceneDescription::load(dir.path().join("missing.json")).unwrap_err();
        assert!(missing.is_io_error());
    }
}
