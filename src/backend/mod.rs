//! Message sources
//!
//! A session pulls messages from exactly one [`Backend`], chosen when the
//! session is created. All variants expose the same three operations: read
//! the next message, resolve a pid to a process name, and close.

pub mod device;
pub mod dummy;
pub mod pname;

use std::io::Read;
use std::path::Path;

pub use device::{DeviceBackend, FileBackend};
pub use dummy::{DummyBackend, DummyConfig};
pub use pname::{NoResolver, PidResolver, PnameCache, UNKNOWN_PNAME};

use crate::error::Result;
use crate::message::Message;

/// Source of log messages
pub enum Backend {
    /// Live stream from a device bridge
    Device(DeviceBackend),
    /// Captured binary log
    File(FileBackend),
    /// Synthetic messages
    Dummy(DummyBackend),
}

impl Backend {
    /// Live device stream read from `source`
    pub fn device<R: Read + Send + 'static>(source: R) -> Self {
        Backend::Device(DeviceBackend::new(source))
    }

    /// Replay of the capture file at `path`
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Backend::File(FileBackend::open(path)?))
    }

    /// Synthetic message generator
    pub fn dummy(config: DummyConfig) -> Self {
        Backend::Dummy(DummyBackend::new(config))
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Device(_) => "device",
            Backend::File(_) => "file",
            Backend::Dummy(_) => "dummy",
        }
    }

    /// Next message, `None` at end of stream
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        match self {
            Backend::Device(b) => b.read_message(),
            Backend::File(b) => b.read_message(),
            Backend::Dummy(b) => b.read_message(),
        }
    }

    /// Process name for `pid`
    pub fn resolve_pid_name(&mut self, pid: i32) -> String {
        match self {
            Backend::Device(b) => b.resolve_pid_name(pid),
            Backend::File(b) => b.resolve_pid_name(pid),
            Backend::Dummy(b) => b.resolve_pid_name(pid),
        }
    }

    /// Release the underlying source
    pub fn close(&mut self) {
        match self {
            Backend::Device(b) => b.close(),
            Backend::File(b) => b.close(),
            Backend::Dummy(b) => b.close(),
        }
    }
}

impl From<DeviceBackend> for Backend {
    fn from(backend: DeviceBackend) -> Self {
        Backend::Device(backend)
    }
}

impl From<FileBackend> for Backend {
    fn from(backend: FileBackend) -> Self {
        Backend::File(backend)
    }
}

impl From<DummyBackend> for Backend {
    fn from(backend: DummyBackend) -> Self {
        Backend::Dummy(backend)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Backend").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_dispatch() {
        let mut backend = Backend::dummy(DummyConfig::default().interval(Duration::ZERO).limit(1));
        assert_eq!(backend.kind(), "dummy");

        let msg = backend.read_message().unwrap().unwrap();
        assert_eq!(backend.resolve_pid_name(msg.pid), format!("dummy-{}", msg.pid));
        assert!(backend.read_message().unwrap().is_none());
    }

    #[test]
    fn test_from_variants() {
        let backend: Backend = FileBackend::from_reader(Cursor::new(Vec::new())).into();
        assert_eq!(backend.kind(), "file");

        let mut backend = Backend::device(Cursor::new(Vec::new()));
        assert_eq!(backend.kind(), "device");
        assert!(backend.read_message().unwrap().is_none());
        backend.close();
    }
}
