//! Sessions and channels
//!
//! A session owns one backend and one ring buffer. A dedicated writer
//! thread decodes records from the backend and appends them; any number of
//! channels read the history independently.
//!
//! # Architecture
//!
//! ```text
//!   Backend ──► writer thread ──append──► RwLock<RingBuffer + flags>
//!                                │                 ▲   ▲   ▲
//!                                └─ notify_all ─┐  │   │   │ shared reads
//!                                               ▼  │   │   │
//!                                            Condvar  [Channel] [Channel] ...
//!                                                     cursor    cursor
//! ```
//!
//! Readers never get a push: each one re-checks the buffer after every
//! wakeup, so spurious or unrelated wakeups only cost a lookup. A reader
//! that falls so far behind that its next record was evicted skips ahead
//! to the oldest retained one.

pub mod channel;
pub mod config;
pub mod lifecycle;
mod shared;
mod writer;

pub use channel::{Channel, Messages, ReplayFrom};
pub use config::SessionConfig;
pub use lifecycle::Session;
