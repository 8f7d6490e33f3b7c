use crate::error::{DscvrError, Result};

/// Longest varint that still fits in 64 bits
pub const MAX_VARINT_LEN: usize = 10;

/// Wire type carried in the low three bits of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    pub fn as_u8(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = DscvrError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(DscvrError::InvalidWireType(other)),
        }
    }
}

/// Build a tag: `field_number << 3 | wire_type`
pub fn tag(field_number: u32, wire_type: WireType) -> u64 {
    (u64::from(field_number) << 3) | u64::from(wire_type.as_u8())
}

/// Encode an unsigned integer as little-endian base-128
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `encode_varint` emits for `value`
pub fn encoded_varint_len(value: u64) -> usize {
    // 1 byte per started group of 7 bits, at least one byte
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint starting at `cursor`, returning the value and the new cursor
pub fn decode_varint(bytes: &[u8], cursor: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut pos = cursor;

    for i in 0..MAX_VARINT_LEN {
        let byte = *bytes.get(pos).ok_or(DscvrError::MalformedVarint)?;
        pos += 1;

        let low = u64::from(byte & 0x7f);
        if i == MAX_VARINT_LEN - 1 {
            if byte & 0x80 != 0 {
                // Continuation chain longer than any 64-bit value
                return Err(DscvrError::MalformedVarint);
            }
            if low > 1 {
                // Tenth byte may only carry bit 63
                return Err(DscvrError::IntegerOverflow);
            }
        }
        value |= low << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((value, pos));
        }
    }

    Err(DscvrError::MalformedVarint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7f]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(300), vec![0xac, 0x02]);
        assert_eq!(encoded(u64::MAX).len(), MAX_VARINT_LEN);
        assert_eq!(*encoded(u64::MAX).last().unwrap(), 0x01);
    }

    #[test]
    fn test_encoded_len_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 1 << 35, (1 << 53) + 1, u64::MAX] {
            assert_eq!(encoded_varint_len(value), encoded(value).len(), "value {value}");
        }
    }

    #[test]
    fn test_decode_advances_cursor() -> Result<()> {
        let bytes = [0xff, 0xac, 0x02, 0x05];
        let (value, cursor) = decode_varint(&bytes, 1)?;
        assert_eq!(value, 300);
        assert_eq!(cursor, 3);

        let (value, cursor) = decode_varint(&bytes, cursor)?;
        assert_eq!(value, 5);
        assert_eq!(cursor, 4);
        Ok(())
    }

    #[test]
    fn test_decode_u64_max() -> Result<()> {
        let bytes = encoded(u64::MAX);
        assert_eq!(decode_varint(&bytes, 0)?, (u64::MAX, MAX_VARINT_LEN));
        Ok(())
    }

    #[test]
    fn test_decode_exhausted_input() {
        assert!(matches!(decode_varint(&[0x80, 0x80], 0), Err(DscvrError::MalformedVarint)));
        assert!(matches!(decode_varint(&[], 0), Err(DscvrError::MalformedVarint)));
    }

    #[test]
    fn test_decode_chain_too_long() {
        let bytes = [0x80; 11];
        assert!(matches!(decode_varint(&bytes, 0), Err(DscvrError::MalformedVarint)));

        // Tenth byte carries data bits but still continues
        let bytes = [0xff; 11];
        assert!(matches!(decode_varint(&bytes, 0), Err(DscvrError::MalformedVarint)));

        let mut bytes = vec![0xff; 9];
        bytes.extend_from_slice(&[0x82, 0x00]);
        assert!(matches!(decode_varint(&bytes, 0), Err(DscvrError::MalformedVarint)));
    }

    #[test]
    fn test_decode_tenth_byte_overflow() {
        let mut bytes = vec![0xff; 9];
        bytes.push(0x02);
        assert!(matches!(decode_varint(&bytes, 0), Err(DscvrError::IntegerOverflow)));
    }

    #[test]
    fn test_tag() {
        assert_eq!(tag(1, WireType::LengthDelimited), 10);
        assert_eq!(tag(2, WireType::Varint), 16);
        assert_eq!(tag(3, WireType::Varint), 24);
        assert_eq!(tag(4, WireType::LengthDelimited), 34);
    }

    #[test]
    fn test_wire_type_from_u8() {
        assert_eq!(WireType::try_from(2).unwrap(), WireType::LengthDelimited);
        assert!(matches!(WireType::try_from(6), Err(DscvrError::InvalidWireType(6))));
        assert!(matches!(WireType::try_from(7), Err(DscvrError::InvalidWireType(7))));
    }
}
