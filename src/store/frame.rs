//! Record framing
//!
//! Every record is `[len: u64 BE][payload]`.

use bytes::{Buf, BufMut};

/// Width of the length header in front of every record
pub const LEN_WIDTH: u64 = 8;

/// Encode the length header for a payload of `len` bytes
pub(crate) fn encode_header(len: u64) -> [u8; LEN_WIDTH as usize] {
    let mut header = [0u8; LEN_WIDTH as usize];
    (&mut header[..]).put_u64(len);
    header
}

/// Decode a length header
pub(crate) fn decode_header(header: &[u8; LEN_WIDTH as usize]) -> u64 {
    let mut buf = &header[..];
    buf.get_u64()
}
