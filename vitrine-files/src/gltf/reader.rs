use base64::Engine;

use crate::gltf::types::{
    COMPONENT_F32, COMPONENT_U8, COMPONENT_U16, COMPONENT_U32, GltfDocument,
};
use crate::ParserError;

pub struct GltfReader {}

/// A parsed document together with its resolved binary buffers. The accessor
/// readers below are the only sanctioned way to get geometry data out.
#[derive(Debug)]
pub struct GltfAsset {
    pub document: GltfDocument,
    buffers: Vec<Vec<u8>>,
}

impl GltfReader {
    /// Parses a standalone `.gltf` JSON payload. Buffers must be embedded as
    /// `data:` URIs; the pipeline receives exactly one URL per asset, so
    /// sibling `.bin` files are out of reach and rejected as unsupported.
    pub fn parse_asset(json: &[u8]) -> Result<GltfAsset, ParserError> {
        Self::parse_with_bin(json, None)
    }

    /// Parses the JSON document and resolves buffers, taking `bin` as the
    /// GLB-supplied payload for buffer 0 when present.
    pub fn parse_with_bin(json: &[u8], bin: Option<Vec<u8>>) -> Result<GltfAsset, ParserError> {
        let document: GltfDocument = serde_json::from_slice(json)?;

        if let Some(asset) = &document.asset {
            if !asset.version.starts_with("2.") {
                return Err(ParserError::unsupported(format!(
                    "glTF version {} (only 2.x is decoded)",
                    asset.version
                )));
            }
        }
        if let Some(extension) = document.extensions_required.first() {
            return Err(ParserError::unsupported(format!(
                "required glTF extension {extension}"
            )));
        }

        let mut bin = bin;
        let mut buffers = Vec::with_capacity(document.buffers.len());
        for (i, buffer) in document.buffers.iter().enumerate() {
            match &buffer.uri {
                None if i == 0 => {
                    let payload = bin.take().ok_or_else(|| {
                        ParserError::format("buffer 0 has no URI and no binary chunk is present")
                    })?;
                    buffers.push(payload);
                }
                None => {
                    return Err(ParserError::format(format!(
                        "buffer {i} has no URI and is not buffer 0"
                    )));
                }
                Some(uri) if uri.starts_with("data:") => buffers.push(decode_data_uri(uri)?),
                Some(_) => {
                    return Err(ParserError::unsupported(
                        "external buffer URIs (the asset is fetched as a single payload)",
                    ));
                }
            }
        }

        Ok(GltfAsset { document, buffers })
    }
}

impl GltfAsset {
    /// Reads a VEC3 float accessor, honoring bufferView strides.
    pub fn read_vec3(&self, accessor_idx: usize) -> Result<Vec<[f32; 3]>, ParserError> {
        let accessor = self.accessor(accessor_idx)?;
        expect_accessor_type(accessor, "VEC3")?;
        if accessor.component_type != COMPONENT_F32 {
            return Err(ParserError::unsupported(format!(
                "VEC3 component type {} (only FLOAT)",
                accessor.component_type
            )));
        }

        let (data, stride) = self.accessor_window(accessor_idx, 12)?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            out.push([
                read_f32_le(data, at),
                read_f32_le(data, at + 4),
                read_f32_le(data, at + 8),
            ]);
        }
        Ok(out)
    }

    /// Reads a VEC2 float accessor (texture coordinates).
    pub fn read_vec2(&self, accessor_idx: usize) -> Result<Vec<[f32; 2]>, ParserError> {
        let accessor = self.accessor(accessor_idx)?;
        expect_accessor_type(accessor, "VEC2")?;
        if accessor.component_type != COMPONENT_F32 {
            return Err(ParserError::unsupported(format!(
                "VEC2 component type {} (only FLOAT)",
                accessor.component_type
            )));
        }

        let (data, stride) = self.accessor_window(accessor_idx, 8)?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            out.push([read_f32_le(data, at), read_f32_le(data, at + 4)]);
        }
        Ok(out)
    }

    /// Reads a SCALAR index accessor, widening to u32.
    pub fn read_indices(&self, accessor_idx: usize) -> Result<Vec<u32>, ParserError> {
        let accessor = self.accessor(accessor_idx)?;
        expect_accessor_type(accessor, "SCALAR")?;

        let element_size = match accessor.component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            other => {
                return Err(ParserError::unsupported(format!(
                    "index component type {other}"
                )));
            }
        };

        let (data, stride) = self.accessor_window(accessor_idx, element_size)?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            let value = match element_size {
                1 => data[at] as u32,
                2 => u16::from_le_bytes([data[at], data[at + 1]]) as u32,
                _ => u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]),
            };
            out.push(value);
        }
        Ok(out)
    }

    fn accessor(&self, idx: usize) -> Result<&crate::gltf::types::Accessor, ParserError> {
        let accessor = self
            .document
            .accessors
            .get(idx)
            .ok_or_else(|| ParserError::format(format!("accessor index {idx} out of range")))?;
        if accessor.sparse.is_some() {
            return Err(ParserError::unsupported("sparse accessors"));
        }
        Ok(accessor)
    }

    /// Resolves the byte window an accessor reads from, bounds-checked so the
    /// per-element loops can index without further verification.
    fn accessor_window(&self, accessor_idx: usize, element_size: usize) -> Result<(&[u8], usize), ParserError> {
        let accessor = &self.document.accessors[accessor_idx];
        let view_idx = accessor
            .buffer_view
            .ok_or_else(|| ParserError::format(format!("accessor {accessor_idx} has no bufferView")))?;
        let view = self
            .document
            .buffer_views
            .get(view_idx)
            .ok_or_else(|| ParserError::format(format!("bufferView index {view_idx} out of range")))?;
        let buffer = self
            .buffers
            .get(view.buffer)
            .ok_or_else(|| ParserError::format(format!("buffer index {} out of range", view.buffer)))?;

        let start = view.byte_offset.unwrap_or(0) + accessor.byte_offset.unwrap_or(0);
        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return Err(ParserError::format(format!(
                "bufferView stride {stride} smaller than element size {element_size}"
            )));
        }

        let needed = match accessor.count {
            0 => 0,
            n => (n - 1) * stride + element_size,
        };
        let end = start + needed;
        if end > buffer.len() {
            return Err(ParserError::format(format!(
                "accessor {accessor_idx} reads past its buffer ({end} > {})",
                buffer.len()
            )));
        }

        Ok((&buffer[start..end], stride))
    }
}

fn expect_accessor_type(
    accessor: &crate::gltf::types::Accessor,
    expected: &str,
) -> Result<(), ParserError> {
    if accessor.accessor_type != expected {
        return Err(ParserError::format(format!(
            "expected {expected} accessor, got {}",
            accessor.accessor_type
        )));
    }
    Ok(())
}

fn read_f32_le(data: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// `data:[<mediatype>][;base64],<data>` — only the base64 form carries
/// binary geometry; anything else is malformed for our purposes.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ParserError> {
    let comma = uri
        .find(',')
        .ok_or_else(|| ParserError::format("data URI without comma separator"))?;
    let header = &uri[..comma];
    let payload = &uri[comma + 1..];

    if !header.ends_with(";base64") {
        return Err(ParserError::unsupported("non-base64 data URIs"));
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}
