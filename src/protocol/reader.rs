//! Frame reader
//!
//! Pulls raw bytes from a source, optionally un-escapes them, and assembles
//! header + payload frames. One reader owns one stream; there is no shared
//! scratch state between readers.

use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use super::constants::{DEFAULT_READ_CHUNK_SIZE, EXTENSION_SIZE, HEADER_SIZE, LOGGER_ENTRY_MAX_LEN};
use super::header::FrameHeader;
use super::unescape::CrlfUnescaper;
use crate::error::TransportError;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Largest payload accepted; larger frames are a framing loss
    pub max_payload_size: usize,

    /// Bytes requested from the source per read
    pub read_chunk_size: usize,

    /// Strip the `\r` a remote tty injects before every `\n`
    pub unescape_crlf: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_payload_size: LOGGER_ENTRY_MAX_LEN,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            unescape_crlf: true,
        }
    }
}

impl TransportConfig {
    /// Configuration for a stream that did not pass through a tty
    pub fn raw() -> Self {
        Self {
            unescape_crlf: false,
            ..Default::default()
        }
    }

    /// Set the maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size.max(1);
        self
    }

    /// Set the raw read chunk size
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Enable or disable CR-LF un-escaping
    pub fn unescape_crlf(mut self, enabled: bool) -> Self {
        self.unescape_crlf = enabled;
        self
    }
}

/// One decoded frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,
    /// Payload bytes (`header.len` long)
    pub payload: Bytes,
}

/// Frame reader over any byte source
pub struct FrameReader<R> {
    source: R,
    config: TransportConfig,
    unescaper: Option<CrlfUnescaper>,
    /// Raw read scratch
    chunk: Vec<u8>,
    /// Un-escaped bytes not yet handed out
    pending: BytesMut,
    /// Payload scratch for `next_frame`
    payload: Vec<u8>,
    eof: bool,
    lost: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader with default configuration (un-escaping enabled)
    pub fn new(source: R) -> Self {
        Self::with_config(source, TransportConfig::default())
    }

    /// Create a reader with explicit configuration
    pub fn with_config(source: R, config: TransportConfig) -> Self {
        let unescaper = config.unescape_crlf.then(CrlfUnescaper::new);
        Self {
            source,
            chunk: vec![0; config.read_chunk_size],
            pending: BytesMut::with_capacity(config.read_chunk_size + 1),
            payload: vec![0; config.max_payload_size],
            unescaper,
            config,
            eof: false,
            lost: false,
        }
    }

    /// Get the transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Whether a previous frame exceeded the payload limit
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Consume the reader and return the source
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Refill `pending` with one read from the source.
    ///
    /// Returns `false` once the source is exhausted and everything it
    /// produced has been handed out.
    fn fill(&mut self) -> Result<bool, TransportError> {
        while self.pending.is_empty() {
            if self.eof {
                return Ok(false);
            }

            let n = loop {
                match self.source.read(&mut self.chunk) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };

            if n == 0 {
                self.eof = true;
                if let Some(unescaper) = self.unescaper.as_mut() {
                    unescaper.finish(&mut self.pending);
                }
                continue;
            }

            match self.unescaper.as_mut() {
                Some(unescaper) => unescaper.feed(&self.chunk[..n], &mut self.pending),
                None => self.pending.extend_from_slice(&self.chunk[..n]),
            }
        }
        Ok(true)
    }

    /// Read exactly `out.len()` un-escaped bytes.
    ///
    /// Returns `Ok(out.len())` when filled and `Ok(0)` if the source was
    /// exhausted before the first byte. Running dry part-way through is a
    /// [`TransportError::Truncated`].
    pub fn read_exact_count(&mut self, out: &mut [u8]) -> Result<usize, TransportError> {
        let mut filled = 0;
        while filled < out.len() {
            if !self.fill()? {
                if filled == 0 {
                    return Ok(0);
                }
                return Err(TransportError::Truncated {
                    missing: out.len() - filled,
                });
            }

            let n = self.pending.len().min(out.len() - filled);
            self.pending.copy_to_slice(&mut out[filled..filled + n]);
            filled += n;
        }
        Ok(filled)
    }

    /// Read one frame into `payload`.
    ///
    /// Returns the header on success (its `len` is the number of payload
    /// bytes written) and `None` on clean end of stream. A payload that does
    /// not fit `payload` leaves the stream unusable: this call and every
    /// later one fail with [`TransportError::FramingLost`].
    pub fn read_frame(&mut self, payload: &mut [u8]) -> Result<Option<FrameHeader>, TransportError> {
        if self.lost {
            return Err(TransportError::FramingLost {
                len: 0,
                capacity: payload.len(),
            });
        }

        let mut raw = [0u8; HEADER_SIZE];
        if self.read_exact_count(&mut raw)? == 0 {
            return Ok(None);
        }
        let header = FrameHeader::parse(&raw);

        if header.has_extension() {
            let mut skip = [0u8; EXTENSION_SIZE];
            if self.read_exact_count(&mut skip)? == 0 {
                return Err(TransportError::Truncated {
                    missing: EXTENSION_SIZE + header.payload_len(),
                });
            }
        }

        let len = header.payload_len();
        if len > payload.len() {
            self.lost = true;
            return Err(TransportError::FramingLost {
                len,
                capacity: payload.len(),
            });
        }

        if len > 0 && self.read_exact_count(&mut payload[..len])? == 0 {
            return Err(TransportError::Truncated { missing: len });
        }

        Ok(Some(header))
    }

    /// Read one frame into an owned buffer sized by `max_payload_size`
    pub fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        let mut scratch = std::mem::take(&mut self.payload);
        let result = self.read_frame(&mut scratch);
        let frame = match result {
            Ok(Some(header)) => Some(Frame {
                header,
                payload: Bytes::copy_from_slice(&scratch[..header.payload_len()]),
            }),
            Ok(None) => None,
            Err(e) => {
                self.payload = scratch;
                return Err(e);
            }
        };
        self.payload = scratch;
        Ok(frame)
    }
}
