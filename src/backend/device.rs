//! Live device and captured file backends
//!
//! Both decode the same framed format. A live stream has passed through the
//! device's tty and needs CR-LF un-escaping; a file captured with
//! `adb exec-out` or written by a previous run has not.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::pname::{PidResolver, PnameCache};
use crate::error::Result;
use crate::message::Message;
use crate::protocol::{FrameReader, TransportConfig};

type Source = Box<dyn Read + Send>;

/// Shared decode path for stream-backed sources
struct FramedSource {
    reader: Option<FrameReader<Source>>,
    frames: u64,
}

impl FramedSource {
    fn new(source: Source, config: TransportConfig) -> Self {
        Self {
            reader: Some(FrameReader::with_config(source, config)),
            frames: 0,
        }
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        match reader.next_frame()? {
            Some(frame) => {
                self.frames += 1;
                Ok(Some(Message::from_frame(&frame)))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!(frames = self.frames, "Closed frame source");
        }
    }
}

/// Backend reading the live stream of a device bridge
///
/// The caller spawns the bridge and hands over its stdout (or any other
/// byte source carrying the same stream).
pub struct DeviceBackend {
    source: FramedSource,
    pnames: PnameCache,
}

impl DeviceBackend {
    /// Decode `source` with CR-LF un-escaping enabled
    pub fn new<R: Read + Send + 'static>(source: R) -> Self {
        Self::with_config(source, TransportConfig::default())
    }

    /// Decode `source` with explicit transport settings
    pub fn with_config<R: Read + Send + 'static>(source: R, config: TransportConfig) -> Self {
        Self {
            source: FramedSource::new(Box::new(source), config),
            pnames: PnameCache::default(),
        }
    }

    /// Use `resolver` for process names
    pub fn with_resolver(mut self, resolver: impl PidResolver + 'static) -> Self {
        self.pnames = PnameCache::new(resolver);
        self
    }

    pub fn read_message(&mut self) -> Result<Option<Message>> {
        self.source.read_message()
    }

    pub fn resolve_pid_name(&mut self, pid: i32) -> String {
        self.pnames.resolve(pid)
    }

    /// Drop the byte source; later reads report end of stream
    pub fn close(&mut self) {
        self.source.close();
    }
}

/// Backend replaying a captured binary log
pub struct FileBackend {
    source: FramedSource,
    pnames: PnameCache,
}

impl FileBackend {
    /// Open a capture file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened capture file");
        Ok(Self::from_reader(file))
    }

    /// Replay from any reader holding an un-mangled capture
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::with_config(reader, TransportConfig::raw())
    }

    pub fn with_config<R: Read + Send + 'static>(reader: R, config: TransportConfig) -> Self {
        Self {
            source: FramedSource::new(Box::new(reader), config),
            pnames: PnameCache::default(),
        }
    }

    /// Use `resolver` for process names
    pub fn with_resolver(mut self, resolver: impl PidResolver + 'static) -> Self {
        self.pnames = PnameCache::new(resolver);
        self
    }

    pub fn read_message(&mut self) -> Result<Option<Message>> {
        self.source.read_message()
    }

    pub fn resolve_pid_name(&mut self, pid: i32) -> String {
        self.pnames.resolve(pid)
    }

    pub fn close(&mut self) {
        self.source.close();
    }
}
