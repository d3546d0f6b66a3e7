//! Wire protocol constants

/// Size of the fixed frame header (`len`, `pad`, `pid`, `tid`, `sec`, `nsec`)
pub const HEADER_SIZE: usize = 20;

/// Size of the extra field newer header variants place before the payload
pub const EXTENSION_SIZE: usize = 4;

/// Largest payload the device side will emit for a single entry
pub const LOGGER_ENTRY_MAX_LEN: usize = 5 * 1024;

/// Default number of raw bytes pulled from the source per read
pub const DEFAULT_READ_CHUNK_SIZE: usize = 10 * LOGGER_ENTRY_MAX_LEN;

/// Carriage return injected by the remote terminal
pub const CR: u8 = 0x0d;

/// Line feed
pub const LF: u8 = 0x0a;
