use base64::Engine;

use crate::gltf::reader::GltfReader;
use crate::ParserError;

fn triangle_bytes() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u16; 3] = [0, 1, 2];

    let mut buffer = Vec::new();
    for p in positions {
        buffer.extend_from_slice(&p.to_le_bytes());
    }
    for i in indices {
        buffer.extend_from_slice(&i.to_le_bytes());
    }
    buffer
}

fn triangle_document(buffer_uri: &str, byte_length: usize) -> String {
    serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "triangle" }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "material": 0
            }]
        }],
        "materials": [{
            "name": "red",
            "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "buffers": [{ "byteLength": byte_length, "uri": buffer_uri }]
    })
    .to_string()
}

fn data_uri(payload: &[u8]) -> String {
    format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(payload)
    )
}

#[test]
fn parses_triangle_with_data_uri_buffer() -> Result<(), anyhow::Error> {
    let buffer = triangle_bytes();
    let json = triangle_document(&data_uri(&buffer), buffer.len());

    let asset = GltfReader::parse_asset(json.as_bytes())?;
    assert_eq!(asset.document.nodes.len(), 1);
    assert_eq!(asset.document.materials.len(), 1);

    let positions = asset.read_vec3(0)?;
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[1], [1.0, 0.0, 0.0]);

    let indices = asset.read_indices(1)?;
    assert_eq!(indices, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn rejects_unknown_major_version() {
    let json = r#"{ "asset": { "version": "1.0" } }"#;
    let err = GltfReader::parse_asset(json.as_bytes()).unwrap_err();
    assert!(matches!(err, ParserError::UnsupportedFeature { .. }));
}

#[test]
fn rejects_external_buffer_uri() {
    let json = triangle_document("mesh.bin", 42);
    let err = GltfReader::parse_asset(json.as_bytes()).unwrap_err();
    assert!(matches!(err, ParserError::UnsupportedFeature { .. }));
}

#[test]
fn rejects_accessor_reading_past_buffer() -> Result<(), anyhow::Error> {
    // Buffer only holds the positions; the index view starts past the end.
    let buffer = &triangle_bytes()[..36];
    let json = triangle_document(&data_uri(buffer), buffer.len());

    let asset = GltfReader::parse_asset(json.as_bytes())?;
    assert!(asset.read_vec3(0).is_ok());
    let err = asset.read_indices(1).unwrap_err();
    assert!(matches!(err, ParserError::FormatError { .. }));
    Ok(())
}

#[test]
fn rejects_malformed_json() {
    let err = GltfReader::parse_asset(b"{ not json").unwrap_err();
    assert!(matches!(err, ParserError::JsonError(_)));
}

#[test]
fn rejects_wrong_accessor_type() -> Result<(), anyhow::Error> {
    let buffer = triangle_bytes();
    let json = triangle_document(&data_uri(&buffer), buffer.len());

    let asset = GltfReader::parse_asset(json.as_bytes())?;
    // Accessor 1 is SCALAR; asking for VEC3 is a format violation.
    assert!(matches!(
        asset.read_vec3(1).unwrap_err(),
        ParserError::FormatError { .. }
    ));
    Ok(())
}
