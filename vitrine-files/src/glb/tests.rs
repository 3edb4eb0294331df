use std::io::Cursor;

use crate::glb::reader::GlbReader;
use crate::glb::types::{FOURCC_CHUNK_BIN, FOURCC_CHUNK_JSON, FOURCC_GLB};
use crate::ParserError;

fn chunk(magic: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(data);
    out
}

fn container(version: u32, chunks: &[Vec<u8>]) -> Vec<u8> {
    let payload: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::new();
    out.extend_from_slice(&FOURCC_GLB.to_le_bytes());
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&((12 + payload) as u32).to_le_bytes());
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

fn triangle_json(byte_length: usize) -> String {
    serde_json::json!({
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0] }],
        "scene": 0,
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": byte_length }]
    })
    .to_string()
}

fn triangle_bin() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
    positions.iter().flat_map(|p| p.to_le_bytes()).collect()
}

#[test]
fn parses_container_with_bin_chunk() -> Result<(), anyhow::Error> {
    let bin = triangle_bin();
    let json = triangle_json(bin.len());
    let data = container(
        2,
        &[chunk(FOURCC_CHUNK_JSON, json.as_bytes()), chunk(FOURCC_CHUNK_BIN, &bin)],
    );

    let asset = GlbReader::parse_asset(&mut Cursor::new(data))?;
    let positions = asset.read_vec3(0)?;
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[1], [2.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn skips_unknown_chunk_types() -> Result<(), anyhow::Error> {
    let bin = triangle_bin();
    let json = triangle_json(bin.len());
    let data = container(
        2,
        &[
            chunk(FOURCC_CHUNK_JSON, json.as_bytes()),
            chunk(u32::from_le_bytes(*b"EXTN"), b"opaque vendor payload"),
            chunk(FOURCC_CHUNK_BIN, &bin),
        ],
    );

    let asset = GlbReader::parse_asset(&mut Cursor::new(data))?;
    assert_eq!(asset.read_vec3(0)?.len(), 3);
    Ok(())
}

#[test]
fn rejects_bad_magic() {
    let mut data = container(2, &[]);
    data[0..4].copy_from_slice(b"NOPE");

    let err = GlbReader::parse_asset(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, ParserError::InvalidMagicValue { .. }));
}

#[test]
fn rejects_unsupported_version() {
    let json = triangle_json(0);
    let data = container(1, &[chunk(FOURCC_CHUNK_JSON, json.as_bytes())]);

    let err = GlbReader::parse_asset(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, ParserError::FormatError { .. }));
}

#[test]
fn rejects_missing_json_chunk() {
    let data = container(2, &[chunk(FOURCC_CHUNK_BIN, &triangle_bin())]);

    let err = GlbReader::parse_asset(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, ParserError::FormatError { .. }));
}

#[test]
fn rejects_truncated_chunk() {
    let json = triangle_json(0);
    let mut data = container(2, &[chunk(FOURCC_CHUNK_JSON, json.as_bytes())]);
    data.truncate(data.len() - 8);

    let err = GlbReader::parse_asset(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, ParserError::ReadError { .. }));
}

#[test]
fn missing_bin_chunk_fails_buffer_resolution() {
    let json = triangle_json(36);
    let data = container(2, &[chunk(FOURCC_CHUNK_JSON, json.as_bytes())]);

    let err = GlbReader::parse_asset(&mut Cursor::new(data)).unwrap_err();
    assert!(matches!(err, ParserError::FormatError { .. }));
}
