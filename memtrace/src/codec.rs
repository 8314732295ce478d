//! Little-endian scalar/string primitives shared by the debug-info and
//! session serializers. Strings are a u32 byte length followed by UTF-8.

use crate::domain::FormatError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub(crate) fn write_str<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(u32::try_from(s.len()).unwrap_or(u32::MAX))?;
    w.write_all(s.as_bytes())
}

pub(crate) fn read_str<R: Read>(r: &mut R) -> Result<String, FormatError> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
