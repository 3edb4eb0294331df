use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::common::reader::{read_array, read_bytes_exact, Parseable};
use crate::fbx::types::{
    FBX_MAGIC, FBX_VERSION_MAX, FBX_VERSION_MIN, FBX_VERSION_WIDE_OFFSETS, FbxAsset, FbxNode,
    FbxProperty, PropertyTypeCode,
};
use crate::ParserError;

pub struct FbxReader {}

impl FbxReader {
    pub fn parse_asset<R: Read + Seek>(rdr: &mut R) -> Result<FbxAsset, ParserError> {
        let header = read_bytes_exact(rdr, 23)?;
        if &header[..21] != FBX_MAGIC {
            // The first word is enough to tell apart ASCII exports and plain garbage.
            let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u32::<LittleEndian>()?;
        if !(FBX_VERSION_MIN..=FBX_VERSION_MAX).contains(&version) {
            return Err(ParserError::unsupported(format!(
                "container version {version} (supported: {FBX_VERSION_MIN}..={FBX_VERSION_MAX})"
            )));
        }

        let mut nodes = Vec::new();
        while let Some(node) = Self::parse_node(rdr, version)? {
            nodes.push(node);
        }

        Ok(FbxAsset { version, nodes })
    }

    /// One node record; `None` is the null record that terminates a child
    /// list (and the top-level list, where a footer follows that we never read).
    fn parse_node<R: Read + Seek>(rdr: &mut R, version: u32) -> Result<Option<FbxNode>, ParserError> {
        let wide = version >= FBX_VERSION_WIDE_OFFSETS;

        let end_offset = Self::read_offset(rdr, wide)?;
        let num_properties = Self::read_offset(rdr, wide)?;
        let _property_list_len = Self::read_offset(rdr, wide)?;
        let name_len = rdr.read_u8()?;
        let name = String::from_utf8(read_bytes_exact(rdr, name_len as usize)?)?;

        if end_offset == 0 && num_properties == 0 && name.is_empty() {
            return Ok(None);
        }

        let mut properties = Vec::with_capacity(num_properties as usize);
        for _ in 0..num_properties {
            properties.push(Self::parse_property(rdr)?);
        }

        let mut children = Vec::new();
        while rdr.stream_position()? < end_offset {
            match Self::parse_node(rdr, version)? {
                Some(child) => children.push(child),
                None => break,
            }
        }
        let at = rdr.stream_position()?;
        if at > end_offset {
            return Err(ParserError::format(format!(
                "node record '{name}' overran its end offset"
            )));
        }
        if at < end_offset {
            // Trailing padding after the terminator; realign for the next record.
            rdr.seek(std::io::SeekFrom::Start(end_offset))?;
        }

        Ok(Some(FbxNode {
            name,
            properties,
            children,
        }))
    }

    fn read_offset<R: Read>(rdr: &mut R, wide: bool) -> Result<u64, ParserError> {
        if wide {
            Ok(rdr.read_u64::<LittleEndian>()?)
        } else {
            Ok(rdr.read_u32::<LittleEndian>()? as u64)
        }
    }

    fn parse_property<R: Read>(rdr: &mut R) -> Result<FbxProperty, ParserError> {
        let code_byte = rdr.read_u8()?;
        let code = PropertyTypeCode::try_from(code_byte).map_err(|_| {
            ParserError::unsupported(format!("property type code {:?}", code_byte as char))
        })?;

        Ok(match code {
            PropertyTypeCode::I16 => FbxProperty::I16(rdr.read_i16::<LittleEndian>()?),
            PropertyTypeCode::Bool => FbxProperty::Bool(rdr.read_u8()? != 0),
            PropertyTypeCode::I32 => FbxProperty::I32(rdr.read_i32::<LittleEndian>()?),
            PropertyTypeCode::I64 => FbxProperty::I64(rdr.read_i64::<LittleEndian>()?),
            PropertyTypeCode::F32 => FbxProperty::F32(rdr.read_f32::<LittleEndian>()?),
            PropertyTypeCode::F64 => FbxProperty::F64(rdr.read_f64::<LittleEndian>()?),
            PropertyTypeCode::F32Array => FbxProperty::F32Array(Self::parse_array::<f32, R>(rdr, 4)?),
            PropertyTypeCode::F64Array => FbxProperty::F64Array(Self::parse_array::<f64, R>(rdr, 8)?),
            PropertyTypeCode::I32Array => FbxProperty::I32Array(Self::parse_array::<i32, R>(rdr, 4)?),
            PropertyTypeCode::I64Array => FbxProperty::I64Array(Self::parse_array::<i64, R>(rdr, 8)?),
            PropertyTypeCode::BoolArray => {
                let raw = Self::parse_array::<u8, R>(rdr, 1)?;
                FbxProperty::BoolArray(raw.into_iter().map(|b| b != 0).collect())
            }
            PropertyTypeCode::String => {
                let len = rdr.read_u32::<LittleEndian>()?;
                FbxProperty::String(String::from_utf8(read_bytes_exact(rdr, len as usize)?)?)
            }
            PropertyTypeCode::Raw => {
                let len = rdr.read_u32::<LittleEndian>()?;
                FbxProperty::Raw(read_bytes_exact(rdr, len as usize)?)
            }
        })
    }

    /// Array properties carry `{length, encoding, byte count}`; encoding 1
    /// wraps the elements in a zlib stream.
    fn parse_array<T: Parseable<T>, R: Read>(
        rdr: &mut R,
        element_size: usize,
    ) -> Result<Vec<T>, ParserError> {
        let length = rdr.read_u32::<LittleEndian>()? as usize;
        let encoding = rdr.read_u32::<LittleEndian>()?;
        let compressed_len = rdr.read_u32::<LittleEndian>()? as usize;

        match encoding {
            0 => {
                if compressed_len != length * element_size {
                    return Err(ParserError::format(format!(
                        "array byte count {compressed_len} does not match {length} elements"
                    )));
                }
                read_array(rdr, length)
            }
            1 => {
                let compressed = read_bytes_exact(rdr, compressed_len)?;
                let mut decoder = ZlibDecoder::new(compressed.as_slice());
                let mut inflated = Vec::with_capacity(length * element_size);
                decoder
                    .read_to_end(&mut inflated)
                    .map_err(|_| ParserError::format("array payload failed to inflate"))?;
                if inflated.len() != length * element_size {
                    return Err(ParserError::format(format!(
                        "inflated array is {} bytes, expected {}",
                        inflated.len(),
                        length * element_size
                    )));
                }
                read_array(&mut inflated.as_slice(), length)
            }
            other => Err(ParserError::unsupported(format!("array encoding {other}"))),
        }
    }
}
