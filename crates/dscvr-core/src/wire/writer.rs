use crate::message::Message;
use super::varint::{encode_varint, encoded_varint_len, tag, WireType};

pub fn put_varint(buf: &mut Vec<u8>, value: u64) {
    encode_varint(value, buf);
}

pub fn put_tag(buf: &mut Vec<u8>, field: u32, wire_type: WireType) {
    encode_varint(tag(field, wire_type), buf);
}

pub fn put_u64(buf: &mut Vec<u8>, field: u32, value: u64) {
    put_tag(buf, field, WireType::Varint);
    put_varint(buf, value);
}

pub fn put_bool(buf: &mut Vec<u8>, field: u32, value: bool) {
    put_u64(buf, field, u64::from(value));
}

pub fn put_bytes(buf: &mut Vec<u8>, field: u32, value: &[u8]) {
    put_tag(buf, field, WireType::LengthDelimited);
    put_varint(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

pub fn put_string(buf: &mut Vec<u8>, field: u32, value: &str) {
    put_bytes(buf, field, value.as_bytes());
}

/// Write an embedded message as a length-delimited field
pub fn put_message<M: Message>(buf: &mut Vec<u8>, field: u32, message: &M) {
    put_tag(buf, field, WireType::LengthDelimited);
    put_varint(buf, message.encoded_len() as u64);
    message.encode_raw(buf);
}

/// Encoded size of a length-delimited field holding `len` bytes
pub fn bytes_field_len(field: u32, len: usize) -> usize {
    encoded_varint_len(tag(field, WireType::LengthDelimited)) + encoded_varint_len(len as u64) + len
}

pub fn message_field_len<M: Message>(field: u32, message: &M) -> usize {
    bytes_field_len(field, message.encoded_len())
}

/// Encoded size of a varint field
pub fn varint_field_len(field: u32, value: u64) -> usize {
    encoded_varint_len(tag(field, WireType::Varint)) + encoded_varint_len(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_string() {
        let mut buf = Vec::new();
        put_string(&mut buf, 4, "deadbeef");
        assert_eq!(buf[..2], [34, 8]);
        assert_eq!(&buf[2..], b"deadbeef");
        assert_eq!(bytes_field_len(4, 8), buf.len());
    }

    #[test]
    fn test_put_empty_bytes_still_emits_field() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, 1, &[]);
        assert_eq!(buf, vec![10, 0]);
    }

    #[test]
    fn test_put_u64_len() {
        let mut buf = Vec::new();
        put_u64(&mut buf, 2, 2_097_152);
        assert_eq!(buf[0], 16);
        assert_eq!(varint_field_len(2, 2_097_152), buf.len());
    }
}
