//! LEB128 unsigned varints used for feature id deltas.
//!
//! each byte carries 7 value bits, low groups first, and sets its high bit
//! when more bytes follow. 300 encodes as `[0xAC, 0x02]`.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::MaxspeedError;

const CONTINUATION_FLAG: u8 = 0x80;
const LOWER_BITS_MASK: u8 = 0x7F;
/// a u32 never needs more than 5 groups of 7 bits.
const MAX_U32_BYTES: usize = 5;

pub trait WriteVarint: Write {
    fn write_varint(&mut self, mut value: u32) -> Result<(), MaxspeedError> {
        loop {
            let byte = (value as u8) & LOWER_BITS_MASK;
            value >>= 7;
            if value == 0 {
                self.write_u8(byte)?;
                return Ok(());
            }
            self.write_u8(byte | CONTINUATION_FLAG)?;
        }
    }
}

impl<W: Write + ?Sized> WriteVarint for W {}

pub trait ReadVarint: Read {
    fn read_varint(&mut self) -> Result<u32, MaxspeedError> {
        let mut value: u64 = 0;
        for group in 0..MAX_U32_BYTES {
            let byte = self.read_u8().map_err(|e| {
                MaxspeedError::CorruptSection(format!("truncated varint: {e}"))
            })?;
            value |= ((byte & LOWER_BITS_MASK) as u64) << (7 * group);
            if byte & CONTINUATION_FLAG == 0 {
                return u32::try_from(value).map_err(|_| {
                    MaxspeedError::CorruptSection(format!("varint {value} exceeds 32 bits"))
                });
            }
        }
        Err(MaxspeedError::CorruptSection(format!(
            "varint is longer than {MAX_U32_BYTES} bytes"
        )))
    }
}

impl<R: Read + ?Sized> ReadVarint for R {}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u32) -> Vec<u8> {
        let mut out = vec![];
        out.write_varint(value).unwrap();
        out
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        assert_eq!(encode(u32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_decode_sequence() {
        let mut bytes = vec![];
        for v in [0, 1, 300, 16_384, u32::MAX] {
            bytes.write_varint(v).unwrap();
        }
        let mut reader = bytes.as_slice();
        for v in [0, 1, 300, 16_384, u32::MAX] {
            assert_eq!(reader.read_varint().unwrap(), v);
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_varint() {
        let mut reader: &[u8] = &[0x80, 0x80];
        assert!(matches!(
            reader.read_varint(),
            Err(MaxspeedError::CorruptSection(_))
        ));
    }

    #[test]
    fn test_overlong_varint() {
        let mut reader: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        assert!(reader.read_varint().is_err());
        let mut reader: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(reader.read_varint().is_err());
    }
}
