//! Android logcat stream decoding with replayable history
//!
//! `logcat-rs` reads the binary output of `adb exec-out logcat -B`, keeps
//! the most recent messages in a bounded ring buffer, and lets any number
//! of readers walk that history with their own filter.
//!
//! # Layers
//!
//! - [`protocol`]: CR-LF unescaping and frame assembly for the raw byte stream
//! - [`message`]: decoded log messages and their stored record format
//! - [`buffer`]: fixed-capacity ring buffer with sequence numbers and cursors
//! - [`filter`]: boolean filter expressions over message fields
//! - [`backend`]: message sources (device stream, saved file, synthetic)
//! - [`session`]: writer thread plus blocking, filtered channels
//! - [`bridge`]: delivers a channel into an async `mpsc` receiver
//!
//! # Example
//! ```no_run
//! use logcat_rs::{Backend, DummyConfig, Filter, Session};
//!
//! # fn main() -> logcat_rs::Result<()> {
//! let session = Session::new(Backend::dummy(DummyConfig::default()));
//! session.start()?;
//!
//! let filter = Filter::new("level >= 5 && pname !~ \"^dummy-1$\"")?;
//! let channel = session.open_channel();
//! for msg in channel.messages(&filter).take(10) {
//!     println!("{}", msg);
//! }
//!
//! drop(channel);
//! session.destroy();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bridge;
pub mod buffer;
pub mod error;
pub mod filter;
pub mod message;
pub mod protocol;
pub mod session;
pub mod stats;

pub use backend::{Backend, DeviceBackend, DummyConfig, FileBackend, PidResolver};
pub use bridge::AsyncChannel;
pub use buffer::RingBuffer;
pub use error::{Error, Result};
pub use filter::Filter;
pub use message::{Level, Message};
pub use protocol::{FrameReader, TransportConfig};
pub use session::{Channel, ReplayFrom, Session, SessionConfig};
pub use stats::SessionStats;
