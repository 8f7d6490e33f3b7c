//! Low-level wire primitives: varints, tags and length-delimited framing

mod reader;
mod varint;
mod writer;

pub use reader::Reader;
pub use varint::{decode_varint, encode_varint, encoded_varint_len, tag, WireType, MAX_VARINT_LEN};
pub use writer::{
    bytes_field_len, message_field_len, put_bool, put_bytes, put_message, put_string, put_tag,
    put_u64, put_varint, varint_field_len,
};
