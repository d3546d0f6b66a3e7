//! Decoded log messages and their stored record form

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::Frame;

/// Size of the fixed part of a stored record (pid, tid, sec, nsec, pname length)
pub const RECORD_HEADER_SIZE: usize = 4 * 4 + 2;

/// Priority of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Verbose = 2,
    Debug = 3,
    Info = 4,
    Warning = 5,
    Error = 6,
    Assert = 7,
}

impl Level {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(Level::Verbose),
            3 => Some(Level::Debug),
            4 => Some(Level::Info),
            5 => Some(Level::Warning),
            6 => Some(Level::Error),
            7 => Some(Level::Assert),
            _ => None,
        }
    }

    /// One-letter form used by logcat's brief output
    pub fn letter(&self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warning => 'W',
            Level::Error => 'E',
            Level::Assert => 'A',
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A decoded log message
///
/// Owns its payload; `tag` and `text` are copies split out of it, so a
/// message stays valid after the ring buffer entry it came from is evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Ring buffer sequence number (0 until stored)
    pub sequence: u64,
    pub pid: i32,
    pub tid: i32,
    pub sec: i32,
    pub nsec: i32,
    /// Raw priority byte, see [`Level::from_u8`]
    pub level: u8,
    pub tag: String,
    pub text: String,
    /// Process name, filled in by the session writer
    pub pname: String,
    /// Raw payload as received
    pub payload: Bytes,
}

impl Message {
    /// Build a message from a decoded transport frame
    pub fn from_frame(frame: &Frame) -> Self {
        let (level, tag, text) = split_payload(&frame.payload);
        Self {
            sequence: 0,
            pid: frame.header.pid,
            tid: frame.header.tid,
            sec: frame.header.sec,
            nsec: frame.header.nsec,
            level,
            tag,
            text,
            pname: String::new(),
            payload: frame.payload.clone(),
        }
    }

    /// Build a message from its parts, synthesizing the wire payload
    pub fn compose(pid: i32, tid: i32, sec: i32, nsec: i32, level: u8, tag: &str, text: &str) -> Self {
        let mut payload = BytesMut::with_capacity(tag.len() + text.len() + 3);
        payload.put_u8(level);
        payload.extend_from_slice(tag.as_bytes());
        payload.put_u8(0);
        payload.extend_from_slice(text.as_bytes());
        payload.put_u8(0);

        let payload = payload.freeze();
        let (level, tag, text) = split_payload(&payload);
        Self {
            sequence: 0,
            pid,
            tid,
            sec,
            nsec,
            level,
            tag,
            text,
            pname: String::new(),
            payload,
        }
    }

    /// Set the process name
    pub fn with_pname(mut self, pname: impl Into<String>) -> Self {
        self.pname = pname.into();
        self
    }

    /// Priority as a known level, if it is one
    pub fn priority(&self) -> Option<Level> {
        Level::from_u8(self.level)
    }

    /// Serialized size of [`Message::encode_record`]
    pub fn record_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.pname.len().min(u16::MAX as usize) + self.payload.len()
    }

    /// Serialize the message for storage in the ring buffer
    ///
    /// Layout: `pid, tid, sec, nsec` (i32 LE), `pname_len` (u16 LE), pname
    /// bytes, raw payload. Level, tag and text are re-derived from the
    /// payload on decode.
    pub fn encode_record(&self, buf: &mut BytesMut) {
        let pname = &self.pname.as_bytes()[..self.pname.len().min(u16::MAX as usize)];

        buf.reserve(self.record_len());
        buf.put_i32_le(self.pid);
        buf.put_i32_le(self.tid);
        buf.put_i32_le(self.sec);
        buf.put_i32_le(self.nsec);
        buf.put_u16_le(pname.len() as u16);
        buf.extend_from_slice(pname);
        buf.extend_from_slice(&self.payload);
    }

    /// Decode a stored record
    pub fn decode_record(sequence: u64, record: &[u8]) -> Result<Self> {
        if record.len() < RECORD_HEADER_SIZE {
            return Err(Error::MalformedRecord("record shorter than its header"));
        }

        let mut buf = record;
        let pid = buf.get_i32_le();
        let tid = buf.get_i32_le();
        let sec = buf.get_i32_le();
        let nsec = buf.get_i32_le();
        let pname_len = buf.get_u16_le() as usize;
        if buf.remaining() < pname_len {
            return Err(Error::MalformedRecord("process name runs past end of record"));
        }
        let pname = String::from_utf8_lossy(&buf[..pname_len]).into_owned();
        buf.advance(pname_len);

        let payload = Bytes::copy_from_slice(buf);
        let (level, tag, text) = split_payload(&payload);

        Ok(Self {
            sequence,
            pid,
            tid,
            sec,
            nsec,
            level,
            tag,
            text,
            pname,
            payload,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.priority() {
            Some(level) => level.letter(),
            None => '?',
        };
        write!(
            f,
            "{:>5} {:>5} {} {}: {}",
            self.pid, self.tid, level, self.tag, self.text
        )
    }
}

/// Split a raw payload into level, tag and text
///
/// Byte 0 is the level, followed by a NUL-terminated tag and a
/// NUL-terminated text. A missing terminator ends the field at the end of
/// the payload. Trailing newlines are stripped from the text.
pub fn split_payload(payload: &[u8]) -> (u8, String, String) {
    let Some((&level, rest)) = payload.split_first() else {
        return (0, String::new(), String::new());
    };

    let (tag, rest) = take_cstr(rest);
    let (text, _) = take_cstr(rest);

    let mut end = text.len();
    while end > 0 && text[end - 1] == b'\n' {
        end -= 1;
    }

    (
        level,
        String::from_utf8_lossy(tag).into_owned(),
        String::from_utf8_lossy(&text[..end]).into_owned(),
    )
}

fn take_cstr(buf: &[u8]) -> (&[u8], &[u8]) {
    match buf.iter().position(|&b| b == 0) {
        Some(nul) => (&buf[..nul], &buf[nul + 1..]),
        None => (buf, &[]),
    }
}
