use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::common::reader::Parseable;
use crate::glb::types::{FOURCC_CHUNK_BIN, FOURCC_CHUNK_JSON, FOURCC_GLB, GLB_VERSION, GlbChunk};
use crate::gltf::reader::{GltfAsset, GltfReader};
use crate::ParserError;

pub struct GlbReader {}

impl GlbReader {
    /// Parses the binary container and hands the embedded JSON document plus
    /// BIN chunk over to the glTF reader. Unknown chunk types are skipped,
    /// as the container format requires.
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<GltfAsset, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_GLB {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u32::<LittleEndian>()?;
        if version != GLB_VERSION {
            return Err(ParserError::format(format!(
                "container version {version} (expected {GLB_VERSION})"
            )));
        }

        let declared_length = rdr.read_u32::<LittleEndian>()? as u64;
        if declared_length < 12 {
            return Err(ParserError::format("declared length shorter than the header"));
        }

        let mut remaining = declared_length - 12;
        let mut json_chunk: Option<GlbChunk> = None;
        let mut bin_chunk: Option<GlbChunk> = None;

        while remaining >= 8 {
            let chunk = GlbChunk::parse(rdr)?;
            if chunk.wire_size() > remaining {
                return Err(ParserError::format(
                    "chunk extends past the container's declared length",
                ));
            }
            remaining -= chunk.wire_size();

            match chunk.magic {
                FOURCC_CHUNK_JSON => json_chunk = Some(chunk),
                FOURCC_CHUNK_BIN => bin_chunk = Some(chunk),
                _ => (),
            }
        }

        let json = json_chunk
            .ok_or_else(|| ParserError::format("container carries no JSON chunk"))?;
        GltfReader::parse_with_bin(&json.data, bin_chunk.map(|chunk| chunk.data))
    }
}
