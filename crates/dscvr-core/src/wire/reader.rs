use crate::error::{DscvrError, Result};
use super::varint::{decode_varint, WireType};

/// Largest field number a tag may carry
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// Nesting limit when skipping unknown groups
const MAX_GROUP_DEPTH: usize = 64;

/// Cursor over an encoded message buffer
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, pos) = decode_varint(self.buf, self.pos)?;
        self.pos = pos;
        Ok(value)
    }

    /// Read a tag and split it into field number and wire type
    pub fn read_tag(&mut self) -> Result<(u32, WireType)> {
        let raw = self.read_varint()?;
        let field = raw >> 3;
        if field == 0 || field > MAX_FIELD_NUMBER {
            return Err(DscvrError::InvalidTag(format!("field number {field} out of range")));
        }
        let wire_type = WireType::try_from((raw & 0x7) as u8)?;
        Ok((field as u32, wire_type))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_varint()
    }

    /// Any non-zero varint is `true`
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_varint()? != 0)
    }

    /// Read a length prefix followed by that many raw bytes
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DscvrError::IntegerOverflow)?;
        self.take(len)
    }

    pub fn read_string(&mut self, field: &'static str) -> Result<String> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DscvrError::InvalidUtf8 { field })
    }

    /// Skip one value of the given wire type
    pub fn skip(&mut self, field: u32, wire_type: WireType) -> Result<()> {
        self.skip_nested(field, wire_type, 0)
    }

    fn skip_nested(&mut self, field: u32, wire_type: WireType, depth: usize) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::LengthDelimited => {
                self.read_bytes()?;
            }
            WireType::StartGroup => {
                if depth >= MAX_GROUP_DEPTH {
                    return Err(DscvrError::InvalidTag("groups nested too deeply".to_string()));
                }
                loop {
                    let (inner, inner_type) = self.read_tag()?;
                    if inner_type == WireType::EndGroup {
                        if inner != field {
                            return Err(DscvrError::InvalidTag(format!(
                                "end-group {inner} does not match start-group {field}"
                            )));
                        }
                        break;
                    }
                    self.skip_nested(inner, inner_type, depth + 1)?;
                }
            }
            WireType::EndGroup => {
                return Err(DscvrError::InvalidTag(format!(
                    "unexpected end-group for field {field}"
                )));
            }
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DscvrError::TruncatedMessage { needed: len, remaining });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }
}
