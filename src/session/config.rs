//! Session configuration

use crate::buffer::ENTRY_HEADER_SIZE;
use crate::message::RECORD_HEADER_SIZE;

/// Default ring buffer arena size
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Smallest arena that can hold an empty record
pub const MIN_BUFFER_SIZE: usize = ENTRY_HEADER_SIZE + RECORD_HEADER_SIZE;

/// Session configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ring buffer arena size in bytes
    pub buffer_size: usize,

    /// Name given to the writer thread
    pub thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            thread_name: "logcat-writer".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a config with a custom buffer size
    pub fn with_buffer_size(size: usize) -> Self {
        Self::default().buffer_size(size)
    }

    /// Set the ring buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(MIN_BUFFER_SIZE);
        self
    }

    /// Set the writer thread name
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.buffer_size, 4 * 1024 * 1024);
        assert_eq!(config.thread_name, "logcat-writer");
    }

    #[test]
    fn test_builder_chaining() {
        let config = SessionConfig::default()
            .buffer_size(64 * 1024)
            .thread_name("device-1");
        assert_eq!(config.buffer_size, 64 * 1024);
        assert_eq!(config.thread_name, "device-1");
    }

    #[test]
    fn test_buffer_size_clamped() {
        assert_eq!(SessionConfig::with_buffer_size(0).buffer_size, MIN_BUFFER_SIZE);
    }
}
