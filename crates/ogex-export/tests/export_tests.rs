//! End-to-end exporter tests: scene file in, OpenGEX text out

use ogex_core::Error;
use ogex_ddl::{EncodeOptions, EncodingMode, UnresolvedPolicy};
use ogex_export::{ExportOptions, OgexExporter, SceneDescription};
use tempfile::TempDir;

const SHARED_MESH_SCENE: &str = r#"{
    "scale": 0.01,
    "nodes": [
        {"name": "Left", "mesh": "Quad", "materials": ["Red"]},
        {"name": "Right", "mesh": "Quad", "materials": ["Red", "Blue"],
         "transform": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 3, 0, 0, 1]}
    ],
    "meshes": [{
        "name": "Quad",
        "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]],
        "normals": [[0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1]],
        "material_indices": [0, 1]
    }],
    "materials": [
        {"name": "Red", "diffuse": [1, 0, 0]},
        {"name": "Blue", "diffuse": [0, 0, 1]}
    ]
}"#;

fn write_scene(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn export_text(scene: &SceneDescription, options: ExportOptions) -> String {
    let mut out = Vec::new();
    OgexExporter::with_options(options)
        .export_to_writer(scene, &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_shared_mesh_exports_one_geometry_object() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    let text = export_text(&scene, ExportOptions::default());

    assert_eq!(text.matches("GeometryObject $geometry").count(), 1);
    assert_eq!(text.matches("ObjectRef {ref {$geometry1}}").count(), 2);
    assert_eq!(text.matches("Material $material").count(), 2);
    assert!(text.contains("MaterialRef (index = 1) {ref {$material2}}"));
    assert!(text.starts_with("Metric (key = \"distance\") {float {0.01}}\n"));
}

#[test]
fn test_welded_vertex_data_and_material_groups() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    let text = export_text(&scene, ExportOptions::default());

    // 6 corners weld to 4 vertices, split across two material groups
    assert!(text.contains("{0.0, 0.0, 0.0}, {1.0, 0.0, 0.0}, {0.0, 1.0, 0.0}, {1.0, 1.0, 0.0}"));
    assert!(text.contains("IndexArray (material = 0) {unsigned_int32[3] {{0, 1, 2}}}"));
    assert!(text.contains("IndexArray (material = 1) {unsigned_int32[3] {{1, 2, 3}}}"));
    assert!(!text.contains("attrib = \"texcoord\""));
}

#[test]
fn test_transform_only_on_moved_node() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    let text = export_text(&scene, ExportOptions::default());
    assert_eq!(text.matches("Transform").count(), 1);
    assert!(text.contains("{1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 3.0, 0.0, 0.0, 1.0}"));
}

#[test]
fn test_compressed_mode() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    let text = export_text(
        &scene,
        ExportOptions {
            encode: EncodeOptions {
                mode: EncodingMode::Compressed,
                rounding: Some(6),
            },
            ..ExportOptions::default()
        },
    );

    assert!(text.starts_with("Metric(key=\"distance\"){float{0.01}}"));
    assert!(text.contains("ObjectRef{ref{$geometry1}}"));
    assert!(!text.contains('\n'));
}

#[test]
fn test_export_is_deterministic() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    assert_eq!(
        export_text(&scene, ExportOptions::default()),
        export_text(&scene, ExportOptions::default())
    );
}

#[test]
fn test_missing_mesh_is_null_or_error() {
    let json = r#"{"nodes": [{"name": "Orphan", "mesh": "Nowhere"}]}"#;
    let scene = SceneDescription::from_json_str(json).unwrap();

    let text = export_text(&scene, ExportOptions::default());
    assert!(text.contains("ObjectRef {ref {null}}"));

    let strict = OgexExporter::with_options(ExportOptions {
        unresolved: UnresolvedPolicy::Error,
        ..ExportOptions::default()
    });
    let err = strict.export_to_writer(&scene, &mut Vec::new()).unwrap_err();
    assert!(err.is_reference_error());
    assert!(err.to_string().contains("geometry/Nowhere"));
}

#[test]
fn test_export_file_from_yaml() {
    let dir = TempDir::new().unwrap();
    let input = write_scene(
        &dir,
        "scene.yml",
        "
nodes:
  - name: Tri
    mesh: Tri
meshes:
  - name: Tri
    positions: [[0, 0, 0], [1, 0, 0], [0, 1, 0]]
    normals: [[0, 0, 1], [0, 0, 1], [0, 0, 1]]
    colors: [[1, 0, 0], [0, 1, 0], [0, 0, 1]]
",
    );
    let output = dir.path().join("scene.ogex");

    let summary = OgexExporter::new().export_file(&input, &output).unwrap();
    assert_eq!(summary.nodes, 1);
    assert_eq!(summary.geometry_objects, 1);
    assert_eq!(summary.vertices, 3);
    assert_eq!(summary.triangles, 1);

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("GeometryNode $node1"));
    assert!(text.contains("VertexArray (attrib = \"color\")"));
}

#[test]
fn test_ragged_scene_rejected_with_context() {
    let dir = TempDir::new().unwrap();
    let input = write_scene(
        &dir,
        "broken.json",
        r#"{"meshes": [{"name": "Bad", "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "normals": []}]}"#,
    );

    let err = OgexExporter::new()
        .export_file(&input, dir.path().join("out.ogex"))
        .unwrap_err();
    assert!(matches!(err.root(), Error::InvalidData { .. }));
    assert!(err.to_string().contains("broken.json"));
    assert!(!dir.path().join("out.ogex").exists());
}

#[test]
fn test_invalid_options_rejected_before_writing() {
    let scene = SceneDescription::from_json_str(SHARED_MESH_SCENE).unwrap();
    let exporter = OgexExporter::with_options(ExportOptions {
        vertex_values_per_line: Some(0),
        ..ExportOptions::default()
    });

    let mut out = Vec::new();
    let err = exporter.export_to_writer(&scene, &mut out).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
    assert!(out.is_empty());
}
