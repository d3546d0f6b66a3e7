//! Transport decoder for the binary logcat stream
//!
//! The device bridge delivers framed binary entries through a terminal layer
//! that mangles line endings. Decoding happens in two stages:
//!
//! ```text
//!   byte source ──► CrlfUnescaper ──► FrameReader ──► Frame { header, payload }
//!   (read up to N)  (drops injected    (exact-count reads,
//!                    \r, carries one    extension skip,
//!                    byte across reads) length check)
//! ```
//!
//! Each [`FrameReader`] owns its carry byte and scratch buffers, so any number
//! of streams can be decoded side by side.

pub mod constants;
pub mod header;
pub mod reader;
pub mod unescape;

pub use constants::{HEADER_SIZE, LOGGER_ENTRY_MAX_LEN};
pub use header::FrameHeader;
pub use reader::{Frame, FrameReader, TransportConfig};
pub use unescape::{escape, CrlfUnescaper};
