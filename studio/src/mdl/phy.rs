//! Just enough of the `.phy` collision file to get at its keyvalue text.

use std::mem;

use super::error::{MdlError, TableContext};
use crate::{
    binaries::{read_nullstr, BinaryData, TrackedCursor},
    keyvalues::{self, ParseOptions, Property},
};

#[allow(non_camel_case_types)]
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct phyheader_t {
    pub size: i32, // Size of this header section, normally 16
    pub id: i32,
    pub solid_count: i32,
    pub checksum: i32, // Matches the model's checksum
}

/// Skip the collision solids and parse the text after them.
pub fn parse_phy(data: Vec<u8>, filename: &str) -> Result<Property, MdlError> {
    let mut buffer = TrackedCursor::new(data);
    let header = phyheader_t::read(&mut buffer).table("physics header")?;

    let extra = i64::from(header.size) - mem::size_of::<phyheader_t>() as i64;
    buffer.skip(extra.max(0) as u64);

    for _ in 0..header.solid_count {
        let size = i32::read(&mut buffer).table("physics solid")?;
        buffer.skip(size.max(0) as u64);
    }
    log::debug!("{}: skipped {} solids", filename, { header.solid_count });

    let text = read_nullstr(&mut buffer, None).table("physics keyvalues")?;
    Ok(keyvalues::parse(
        &text,
        &format!("{filename}:keyvalues"),
        ParseOptions {
            allow_escapes: false,
            single_line: true,
        },
    )?)
}
