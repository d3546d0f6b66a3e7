//! CR-LF un-escaping
//!
//! The device shell runs the log producer on a tty, which rewrites every
//! `\n` (0x0a) as `\r\n` (0x0d 0x0a). That is harmless for text but corrupts
//! binary frames, so the injected `\r` has to be removed again:
//!
//! ```text
//! raw:        .. 0d 0a .. 0d 41 .. 0d | 0a ..
//! unescaped:  ..    0a .. 0d 41 ..    | 0a ..
//!                                     ^ read boundary
//! ```
//!
//! A `\r` not followed by `\n` is data and stays. A `\r` that ends a read
//! cannot be classified yet, so it is carried over and re-examined together
//! with the first byte of the next read.

use bytes::{BufMut, BytesMut};

use super::constants::{CR, LF};

/// Streaming un-escaper holding the one-byte carry between reads
#[derive(Debug, Default)]
pub struct CrlfUnescaper {
    pending_cr: bool,
}

impl CrlfUnescaper {
    /// Create an un-escaper with no carried byte
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `\r` from the previous chunk is still undecided
    pub fn has_pending(&self) -> bool {
        self.pending_cr
    }

    /// Un-escape one chunk, appending the result to `out`
    pub fn feed(&mut self, input: &[u8], out: &mut BytesMut) {
        out.reserve(input.len() + 1);

        for &byte in input {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == LF {
                    out.put_u8(LF);
                    continue;
                }
                out.put_u8(CR);
            }

            if byte == CR {
                self.pending_cr = true;
            } else {
                out.put_u8(byte);
            }
        }
    }

    /// Flush the carried `\r` once the source is exhausted
    pub fn finish(&mut self, out: &mut BytesMut) {
        if self.pending_cr {
            self.pending_cr = false;
            out.put_u8(CR);
        }
    }
}

/// Apply the terminal rewrite (`\n` becomes `\r\n`)
///
/// Used to produce device-style input for tests and replay tools.
pub fn escape(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    for &byte in input {
        if byte == LF {
            out.push(CR);
        }
        out.push(byte);
    }
    out
}
