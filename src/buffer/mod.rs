//! Bounded history of stored records
//!
//! A [`RingBuffer`] keeps the most recent entries that fit in a fixed byte
//! arena and numbers every write with a monotonic sequence. Readers use
//! independent [`Cursor`]s that remember only the last sequence they saw.

pub mod cursor;
pub mod layout;
pub mod ring;

pub use cursor::{Cursor, Entries, Entry, ReadInfo};
pub use layout::{entry_size, Placement, ENTRY_HEADER_SIZE};
pub use ring::RingBuffer;
