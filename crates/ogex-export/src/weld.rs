//! Vertex welding
//!
//! Turns one attribute tuple per triangle corner into a shared vertex array
//! plus an index per corner. Two corners share a vertex exactly when every
//! attribute compares equal; there is no distance tolerance.

use std::collections::BTreeMap;

use ogex_core::{Error, Result, Vec2, Vec3};
use smallvec::SmallVec;
use tracing::debug;

const HASH_MULTIPLIER: u64 = 21737;

/// Attributes of one triangle corner
#[derive(Debug, Clone, Copy)]
pub struct ExportVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
    pub texcoord0: Vec2,
    pub texcoord1: Vec2,
    /// Vertex index in the source mesh
    pub source_vertex: u32,
    /// Triangle index in the source mesh
    pub source_face: u32,
    hash: u64,
}

impl ExportVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            color: Vec3::ONE,
            texcoord0: Vec2::ZERO,
            texcoord1: Vec2::ZERO,
            source_vertex: 0,
            source_face: 0,
            hash: 0,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_texcoord0(mut self, texcoord: Vec2) -> Self {
        self.texcoord0 = texcoord;
        self
    }

    pub fn with_texcoord1(mut self, texcoord: Vec2) -> Self {
        self.texcoord1 = texcoord;
        self
    }

    pub fn with_source(mut self, vertex: u32, face: u32) -> Self {
        self.source_vertex = vertex;
        self.source_face = face;
        self
    }

    /// Hash stored by [`weld`]; zero before welding
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Attribute components in hashing order
    fn components(&self) -> [f32; 13] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.color.x,
            self.color.y,
            self.color.z,
            self.texcoord0.x,
            self.texcoord0.y,
            self.texcoord1.x,
            self.texcoord1.y,
        ]
    }

    /// Polynomial hash over all attribute components
    ///
    /// `-0.0` hashes like `0.0` so that corners equal under `==` always land
    /// in the same bucket.
    pub fn content_hash(&self) -> u64 {
        self.components().iter().fold(0u64, |hash, &component| {
            let bits = if component == 0.0 { 0 } else { component.to_bits() as u64 };
            hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(bits)
        })
    }

    /// Exact equality of every attribute; source indices are ignored
    pub fn same_attributes(&self, other: &ExportVertex) -> bool {
        self.components() == other.components()
    }
}

/// Largest power of two not above `corner_count / 8`, at least 1
pub fn bucket_count(corner_count: usize) -> usize {
    let target = (corner_count / 8).max(1);
    1 << target.ilog2()
}

/// Deduplicated vertices and one index per input corner
#[derive(Debug, Clone, Default)]
pub struct WeldedMesh {
    pub vertices: Vec<ExportVertex>,
    pub indices: Vec<u32>,
}

impl WeldedMesh {
    /// Corner indices grouped into triangles; a trailing partial triangle is dropped
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|corner| [corner[0], corner[1], corner[2]])
            .collect()
    }

    /// Triangles grouped by material index, ascending
    ///
    /// Triangles without an entry in `materials` use material 0.
    pub fn triangles_by_material(&self, materials: &[u32]) -> BTreeMap<u32, Vec<[u32; 3]>> {
        let mut groups: BTreeMap<u32, Vec<[u32; 3]>> = BTreeMap::new();
        for (face, triangle) in self.triangles().into_iter().enumerate() {
            let material = materials.get(face).copied().unwrap_or(0);
            groups.entry(material).or_default().push(triangle);
        }
        groups
    }

    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }

    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position.to_array()).collect()
    }

    pub fn normals(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.normal.to_array()).collect()
    }

    pub fn colors(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.color.to_array()).collect()
    }

    pub fn texcoords0(&self) -> Vec<[f32; 2]> {
        self.vertices.iter().map(|v| v.texcoord0.to_array()).collect()
    }

    pub fn texcoords1(&self) -> Vec<[f32; 2]> {
        self.vertices.iter().map(|v| v.texcoord1.to_array()).collect()
    }
}

/// Merge attribute-identical corners
///
/// Single pass in input order. Each corner is hashed and looked up in the
/// bucket `hash % bucket_count`; a candidate is accepted only if its
/// attributes are exactly equal, the hash being a pre-filter. The first
/// match wins, so identical input always produces identical output.
///
/// Fails with `InvalidData` if the unique vertices outgrow `u32` indices.
pub fn weld(corners: Vec<ExportVertex>) -> Result<WeldedMesh> {
    let corner_count = corners.len();
    let buckets_len = bucket_count(corner_count);
    // power of two, so the modulo is a mask
    let mask = (buckets_len - 1) as u64;

    let mut buckets: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); buckets_len];
    let mut vertices: Vec<ExportVertex> = Vec::with_capacity(corner_count);
    let mut indices = Vec::with_capacity(corner_count);

    for mut corner in corners {
        corner.hash = corner.content_hash();
        let bucket = &mut buckets[(corner.hash & mask) as usize];

        let existing = bucket.iter().copied().find(|&candidate| {
            let vertex = &vertices[candidate as usize];
            vertex.hash == corner.hash && vertex.same_attributes(&corner)
        });

        let index = match existing {
            Some(index) => index,
            None => {
                let index = vertex_index(vertices.len())?;
                vertices.push(corner);
                bucket.push(index);
                index
            }
        };
        indices.push(index);
    }

    debug!(
        corners = corner_count,
        vertices = vertices.len(),
        buckets = buckets_len,
        "Welded vertices"
    );

    Ok(WeldedMesh { vertices, indices })
}

/// Index of the next unique vertex
fn vertex_index(vertex_count: usize) -> Result<u32> {
    u32::try_from(vertex_count).map_err(|_| {
        Error::invalid_data(format!(
            "{} unique vertices exceed the 32-bit index range",
            vertex_count as u64 + 1
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(x: f32, y: f32) -> ExportVertex {
        ExportVertex::new(Vec3::new(x, y, 0.0), Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_bucket_count() {
        assert_eq!(bucket_count(0), 1);
        assert_eq!(bucket_count(15), 1);
        assert_eq!(bucket_count(16), 2);
        assert_eq!(bucket_count(24), 2);
        assert_eq!(bucket_count(32), 4);
        assert_eq!(bucket_count(1000), 64);
    }

    #[test]
    fn test_empty_input() {
        let welded = weld(Vec::new()).unwrap();
        assert!(welded.vertices.is_empty());
        assert!(welded.indices.is_empty());
        assert!(welded.max_index().is_none());
    }

    #[test]
    fn test_quad_shares_edge() {
        // two triangles, corners 1/3 and 2/4 coincide
        let corners = vec![
            corner(0.0, 0.0),
            corner(1.0, 0.0),
            corner(0.0, 1.0),
            corner(1.0, 0.0),
            corner(0.0, 1.0),
            corner(1.0, 1.0),
        ];
        let welded = weld(corners).unwrap();

        assert_eq!(welded.vertices.len(), 4);
        assert_eq!(welded.indices, vec![0, 1, 2, 1, 2, 3]);
        assert_eq!(welded.triangles(), vec![[0, 1, 2], [1, 2, 3]]);
    }

    #[test]
    fn test_any_attribute_difference_splits() {
        let base = corner(0.0, 0.0);
        let corners = vec![
            base,
            base.with_color(Vec3::new(1.0, 0.0, 0.0)),
            base.with_texcoord0(Vec2::new(0.5, 0.5)),
            base.with_texcoord1(Vec2::new(0.0, 1.0)),
            ExportVertex::new(base.position, Vec3::new(0.0, 1.0, 0.0)),
            base.with_source(99, 42),
        ];
        let welded = weld(corners).unwrap();

        assert_eq!(welded.vertices.len(), 5);
        assert_eq!(welded.indices, vec![0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_negative_zero_merges() {
        let welded = weld(vec![corner(0.0, 1.0), corner(-0.0, 1.0)]).unwrap();
        assert_eq!(welded.vertices.len(), 1);
    }

    #[test]
    fn test_nan_never_merges() {
        let welded = weld(vec![corner(f32::NAN, 0.0), corner(f32::NAN, 0.0)]).unwrap();
        assert_eq!(welded.vertices.len(), 2);
    }

    #[test]
    fn test_first_occurrence_is_kept() {
        let welded = weld(vec![
            corner(0.0, 0.0).with_source(7, 0),
            corner(0.0, 0.0).with_source(8, 1),
        ])
        .unwrap();
        assert_eq!(welded.vertices[0].source_vertex, 7);
        assert_eq!(welded.vertices[0].hash(), welded.vertices[0].content_hash());
    }

    #[test]
    fn test_vertex_index_range() {
        assert_eq!(vertex_index(0).unwrap(), 0);
        assert_eq!(vertex_index(u32::MAX as usize).unwrap(), u32::MAX);

        let err = vertex_index(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_triangles_by_material() {
        let corners: Vec<_> = (0..9).map(|i| corner(i as f32, 0.0)).collect();
        let welded = weld(corners).unwrap();

        let groups = welded.triangles_by_material(&[2, 0]);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![0, 2]);
        assert_eq!(groups[&0], vec![[3, 4, 5], [6, 7, 8]]);
        assert_eq!(groups[&2], vec![[0, 1, 2]]);
    }
}
