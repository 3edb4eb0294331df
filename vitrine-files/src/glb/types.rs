use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::common::reader::{read_bytes_exact, Parseable};
use crate::ParserError;

pub const FOURCC_GLB: u32 = u32::from_le_bytes(*b"glTF");
pub const FOURCC_CHUNK_JSON: u32 = u32::from_le_bytes(*b"JSON");
pub const FOURCC_CHUNK_BIN: u32 = u32::from_le_bytes(*b"BIN\0");

pub const GLB_VERSION: u32 = 2;

/// One `{length, type, payload}` chunk of the binary container.
#[derive(Debug)]
pub(crate) struct GlbChunk {
    pub magic: u32,
    pub data: Vec<u8>,
}

impl GlbChunk {
    /// Size of the chunk on the wire including its 8-byte header.
    pub fn wire_size(&self) -> u64 {
        8 + self.data.len() as u64
    }
}

impl Parseable<GlbChunk> for GlbChunk {
    fn parse<R: Read>(rdr: &mut R) -> Result<GlbChunk, ParserError> {
        let length = rdr.read_u32::<LittleEndian>()?;
        let magic = rdr.read_u32::<LittleEndian>()?;
        let data = read_bytes_exact(rdr, length as usize)?;
        Ok(GlbChunk { magic, data })
    }
}
