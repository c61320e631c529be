//! GeometryObject assembly
//!
//! Welds a [`TriangleMesh`] and lays the result out as an OpenGEX
//! `GeometryObject`: one `VertexArray` per exported attribute and one
//! `IndexArray` per material group.

use ogex_core::{BoundingBox, Error, Result};
use ogex_ddl::{DataType, Primitive, Structure};
use serde::Serialize;
use tracing::{debug, trace};

use crate::scene::TriangleMesh;
use crate::weld::{weld, WeldedMesh};

const INDEX_ARRAY_PATH: &str = "GeometryObject/Mesh/IndexArray";

/// Which optional vertex streams are exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributes {
    pub normals: bool,
    pub colors: bool,
    pub texcoords: bool,
}

impl Default for VertexAttributes {
    fn default() -> Self {
        Self {
            normals: true,
            colors: true,
            texcoords: true,
        }
    }
}

/// Layout settings for one geometry object
#[derive(Debug, Clone, Copy)]
pub struct GeometrySettings {
    pub attributes: VertexAttributes,
    /// Line wrapping hint for vertex and index data
    pub values_per_line: Option<usize>,
    /// Unsigned integer type of the index arrays
    pub index_type: DataType,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            attributes: VertexAttributes::default(),
            values_per_line: Some(8),
            index_type: DataType::UnsignedInt32,
        }
    }
}

/// Counts for one built geometry object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeometryStats {
    pub corners: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub index_arrays: usize,
}

/// Build `GeometryObject $<name>` for a mesh
pub fn build_geometry_object(
    mesh: &TriangleMesh,
    name: &str,
    settings: &GeometrySettings,
) -> Result<(Structure, GeometryStats)> {
    let attributes = settings.attributes;
    let welded = weld(mesh.corners(attributes))?;
    let groups = welded.triangles_by_material(&mesh.materials_per_triangle());

    let mut body = Structure::new("Mesh").with_property("primitive", "triangles");
    body.push_child(vertex_array("position", Primitive::vectors(&welded.positions()), settings));
    if attributes.normals {
        body.push_child(vertex_array("normal", Primitive::vectors(&welded.normals()), settings));
    }
    if attributes.colors && mesh.colors.is_some() {
        body.push_child(vertex_array("color", Primitive::vectors(&welded.colors()), settings));
    }
    if attributes.texcoords {
        if mesh.texcoords0.is_some() {
            body.push_child(vertex_array("texcoord", Primitive::vectors(&welded.texcoords0()), settings));
        }
        if mesh.texcoords1.is_some() {
            body.push_child(vertex_array("texcoord[1]", Primitive::vectors(&welded.texcoords1()), settings));
        }
    }

    let tag_materials = groups.len() > 1 || groups.keys().any(|&material| material != 0);
    for (&material, triangles) in &groups {
        let mut data = index_primitive(triangles, settings.index_type)?;
        if let Some(per_line) = settings.values_per_line {
            data = data.with_max_elements_per_line(per_line);
        }

        let mut index_array = Structure::new("IndexArray");
        if tag_materials {
            index_array.set_property("material", material);
        }
        body.push_child(index_array.with_child(data));
        trace!(mesh = %mesh.name, material, triangles = triangles.len(), "Index array");
    }

    let stats = GeometryStats {
        corners: mesh.corner_count(),
        vertices: welded.vertices.len(),
        triangles: mesh.triangle_count(),
        index_arrays: groups.len(),
    };
    debug!(
        mesh = %mesh.name,
        corners = stats.corners,
        vertices = stats.vertices,
        triangles = stats.triangles,
        "Built geometry object"
    );

    let object = Structure::new("GeometryObject").with_name(name).with_child(body);
    Ok((object, stats))
}

fn vertex_array(attrib: &str, data: Primitive, settings: &GeometrySettings) -> Structure {
    let data = match settings.values_per_line {
        Some(per_line) => data.with_max_elements_per_line(per_line),
        None => data,
    };
    Structure::new("VertexArray")
        .with_property("attrib", attrib)
        .with_child(data)
}

/// Triangle indices narrowed or widened to `index_type`
fn index_primitive(triangles: &[[u32; 3]], index_type: DataType) -> Result<Primitive> {
    match index_type {
        DataType::UnsignedInt8 => Ok(Primitive::vectors(&convert_indices::<u8>(triangles, index_type)?)),
        DataType::UnsignedInt16 => Ok(Primitive::vectors(&convert_indices::<u16>(triangles, index_type)?)),
        DataType::UnsignedInt32 => Ok(Primitive::vectors(triangles)),
        DataType::UnsignedInt64 => Ok(Primitive::vectors(&convert_indices::<u64>(triangles, index_type)?)),
        other => Err(Error::build(
            INDEX_ARRAY_PATH,
            format!("index type must be an unsigned integer, got {}", other),
        )),
    }
}

fn convert_indices<T>(triangles: &[[u32; 3]], index_type: DataType) -> Result<Vec<[T; 3]>>
where
    T: TryFrom<u32>,
{
    let convert = |index: u32| {
        T::try_from(index).map_err(|_| {
            Error::build(
                INDEX_ARRAY_PATH,
                format!("vertex index {} does not fit {}", index, index_type),
            )
        })
    };

    triangles
        .iter()
        .map(|&[a, b, c]| -> Result<[T; 3]> { Ok([convert(a)?, convert(b)?, convert(c)?]) })
        .collect()
}

/// Per-mesh statistics without building any structures
#[derive(Debug, Clone, Serialize)]
pub struct MeshReport {
    pub name: String,
    pub corners: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Distinct material slots used
    pub materials: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

pub fn inspect_mesh(mesh: &TriangleMesh, attributes: VertexAttributes) -> Result<MeshReport> {
    let welded: WeldedMesh = weld(mesh.corners(attributes))?;
    let materials = welded.triangles_by_material(&mesh.materials_per_triangle()).len();

    Ok(MeshReport {
        name: mesh.name.clone(),
        corners: mesh.corner_count(),
        vertices: welded.vertices.len(),
        triangles: mesh.triangle_count(),
        materials,
        bounds: BoundingBox::from_points(&mesh.positions),
    })
}
