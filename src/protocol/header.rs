//! Frame header
//!
//! Every entry on the wire starts with a packed little-endian header:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+
//! | len(2) | pad(2) | pid(4) | tid(4) | sec(4) | nsec(4)|
//! +--------+--------+--------+--------+--------+--------+
//! ```
//!
//! Legacy producers always write `pad = 0`. Newer ones store the header size
//! there and append one more 32-bit field before the payload, which the
//! reader skips.

use bytes::{Buf, BufMut, BytesMut};

use super::constants::HEADER_SIZE;

/// Decoded frame header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes
    pub len: u16,
    /// Zero for legacy framing, header size for newer variants
    pub pad: u16,
    /// Process ID
    pub pid: i32,
    /// Thread ID
    pub tid: i32,
    /// Timestamp seconds
    pub sec: i32,
    /// Timestamp nanoseconds
    pub nsec: i32,
}

impl FrameHeader {
    /// Parse a header from exactly [`HEADER_SIZE`] bytes
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &raw[..];
        Self {
            len: buf.get_u16_le(),
            pad: buf.get_u16_le(),
            pid: buf.get_i32_le(),
            tid: buf.get_i32_le(),
            sec: buf.get_i32_le(),
            nsec: buf.get_i32_le(),
        }
    }

    /// Serialize the header in wire order
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(HEADER_SIZE);
        buf.put_u16_le(self.len);
        buf.put_u16_le(self.pad);
        buf.put_i32_le(self.pid);
        buf.put_i32_le(self.tid);
        buf.put_i32_le(self.sec);
        buf.put_i32_le(self.nsec);
    }

    /// Whether an extension field follows the header
    pub fn has_extension(&self) -> bool {
        self.pad != 0
    }

    /// Payload length as `usize`
    pub fn payload_len(&self) -> usize {
        self.len as usize
    }
}
