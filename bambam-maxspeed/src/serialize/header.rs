use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::MaxspeedError;

/// current maxspeed section format version.
pub const MAXSPEEDS_VERSION: u16 = 0;
/// size in bytes of the fixed header that starts every maxspeed section.
pub const HEADER_SIZE: usize = 16;

/// fixed-width header of a maxspeed section. offsets are relative to the
/// first byte after the header.
///
/// ```text
/// u16 version
/// u16 endianness      reserved, always 0
/// u32 forward_offset  end of the Elias-Fano id set
/// u32 bidirectional_offset  end of the forward macro codes, start of the bidirectional list
/// u32 bidirectional_count
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionHeader {
    pub version: u16,
    pub endianness: u16,
    pub forward_offset: u32,
    pub bidirectional_offset: u32,
    pub bidirectional_count: u32,
}

impl SectionHeader {
    pub fn new(forward_offset: u32, bidirectional_offset: u32, bidirectional_count: u32) -> Self {
        SectionHeader {
            version: MAXSPEEDS_VERSION,
            endianness: 0,
            forward_offset,
            bidirectional_offset,
            bidirectional_count,
        }
    }

    pub fn has_forward_tier(&self) -> bool {
        self.forward_offset != self.bidirectional_offset
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), MaxspeedError> {
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(self.endianness)?;
        writer.write_u32::<LittleEndian>(self.forward_offset)?;
        writer.write_u32::<LittleEndian>(self.bidirectional_offset)?;
        writer.write_u32::<LittleEndian>(self.bidirectional_count)?;
        Ok(())
    }

    /// reads a header, failing on any version other than [MAXSPEEDS_VERSION].
    pub fn read<R: Read>(reader: &mut R) -> Result<SectionHeader, MaxspeedError> {
        let version = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        if version != MAXSPEEDS_VERSION {
            return Err(MaxspeedError::VersionMismatch {
                expected: MAXSPEEDS_VERSION,
                found: version,
            });
        }
        let endianness = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        let forward_offset = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let bidirectional_offset = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let bidirectional_count = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        if bidirectional_offset < forward_offset {
            return Err(MaxspeedError::CorruptSection(format!(
                "bidirectional offset {bidirectional_offset} precedes forward offset {forward_offset}"
            )));
        }
        Ok(SectionHeader {
            version,
            endianness,
            forward_offset,
            bidirectional_offset,
            bidirectional_count,
        })
    }
}

fn truncated(e: std::io::Error) -> MaxspeedError {
    MaxspeedError::CorruptSection(format!("truncated header: {e}"))
}
