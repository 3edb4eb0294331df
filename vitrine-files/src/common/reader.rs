use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParserError;

/// Sequential little-endian decoding of a value from a byte stream.
pub(crate) trait Parseable<T> {
    fn parse<R: Read>(rdr: &mut R) -> Result<T, ParserError>;
}

impl Parseable<u8> for u8 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u8, ParserError> {
        Ok(rdr.read_u8()?)
    }
}

impl Parseable<u16> for u16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u16, ParserError> {
        Ok(rdr.read_u16::<LittleEndian>()?)
    }
}

impl Parseable<i16> for i16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i16, ParserError> {
        Ok(rdr.read_i16::<LittleEndian>()?)
    }
}

impl Parseable<u32> for u32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u32, ParserError> {
        Ok(rdr.read_u32::<LittleEndian>()?)
    }
}

impl Parseable<i32> for i32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i32, ParserError> {
        Ok(rdr.read_i32::<LittleEndian>()?)
    }
}

impl Parseable<u64> for u64 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u64, ParserError> {
        Ok(rdr.read_u64::<LittleEndian>()?)
    }
}

impl Parseable<i64> for i64 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i64, ParserError> {
        Ok(rdr.read_i64::<LittleEndian>()?)
    }
}

impl Parseable<f32> for f32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<f32, ParserError> {
        Ok(rdr.read_f32::<LittleEndian>()?)
    }
}

impl Parseable<f64> for f64 {
    fn parse<R: Read>(rdr: &mut R) -> Result<f64, ParserError> {
        Ok(rdr.read_f64::<LittleEndian>()?)
    }
}

/// Reads `count` elements of a fixed-size type into a Vec.
pub(crate) fn read_array<T: Parseable<T>, R: Read>(rdr: &mut R, count: usize) -> Result<Vec<T>, ParserError> {
    let mut list = Vec::with_capacity(count);
    for _ in 0..count {
        list.push(T::parse(rdr)?);
    }
    Ok(list)
}

/// Reads an exact number of bytes, surfacing a truncated stream as a ReadError.
pub(crate) fn read_bytes_exact<R: Read>(rdr: &mut R, len: usize) -> Result<Vec<u8>, ParserError> {
    let mut buf = vec![0u8; len];
    rdr.read_exact(&mut buf)
        .map_err(|source| ParserError::ReadError { source })?;
    Ok(buf)
}
