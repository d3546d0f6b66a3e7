//! Session lifecycle

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::channel::{Channel, ReplayFrom};
use super::config::SessionConfig;
use super::shared::Shared;
use super::writer::{self, WriterExit};
use crate::backend::Backend;
use crate::error::Result;
use crate::stats::SessionStats;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Owner of one log source and its history
///
/// ```text
/// new() ──► start() ──► stop() ──► destroy()
///  idle      writer      readers     writer
///            spawned,    get end     joined,
///            active      of stream   buffer freed
/// ```
///
/// `start` may be called again after `stop` to resume delivery. The writer
/// keeps ingesting while the session is stopped.
pub struct Session {
    shared: Arc<Shared>,
    config: SessionConfig,
    /// Taken by the writer thread once it runs
    backend: Arc<Mutex<Option<Backend>>>,
    writer: Mutex<Option<JoinHandle<WriterExit>>>,
}

impl Session {
    /// Create an idle session with default configuration
    pub fn new(backend: Backend) -> Self {
        Self::with_config(backend, SessionConfig::default())
    }

    /// Create an idle session
    pub fn with_config(backend: Backend, config: SessionConfig) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            session_id = id,
            backend = backend.kind(),
            buffer_size = config.buffer_size,
            "Session created"
        );

        Self {
            shared: Arc::new(Shared::new(id, config.buffer_size)),
            config,
            backend: Arc::new(Mutex::new(Some(backend))),
            writer: Mutex::new(None),
        }
    }

    /// Unique id of this session within the process
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Activate the session, spawning the writer on first call
    pub fn start(&self) -> Result<()> {
        let builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Err(e) = self.spawn_writer(builder) {
            tracing::warn!(session_id = self.id(), error = %e, "Failed to spawn writer thread");
            return Err(e.into());
        }

        self.shared.set_active(true);
        tracing::info!(session_id = self.id(), "Session started");
        Ok(())
    }

    /// The backend stays in its slot until the thread takes it, so a failed
    /// spawn leaves the session able to start again.
    fn spawn_writer(&self, builder: thread::Builder) -> std::io::Result<()> {
        let mut writer = self.writer.lock();
        if writer.is_some() {
            return Ok(());
        }

        let slot = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        let handle = builder.spawn(move || {
            let backend = slot.lock().take();
            match backend {
                Some(backend) => writer::run(shared, backend),
                None => {
                    shared.mark_exhausted();
                    WriterExit::Shutdown
                }
            }
        })?;
        *writer = Some(handle);
        Ok(())
    }

    /// Deactivate the session
    ///
    /// Every blocked read returns end of stream. The buffer is kept.
    pub fn stop(&self) {
        self.shared.set_active(false);
        tracing::info!(session_id = self.id(), "Session stopped");
    }

    /// Whether readers can still receive new records
    pub fn is_active(&self) -> bool {
        let inner = self.shared.state.read();
        inner.active && !inner.exhausted
    }

    /// Open a channel positioned before the oldest retained record
    pub fn open_channel(&self) -> Channel {
        self.open_channel_at(ReplayFrom::Oldest)
    }

    /// Open a channel at a chosen replay position
    pub fn open_channel_at(&self, from: ReplayFrom) -> Channel {
        Channel::open(Arc::clone(&self.shared), from)
    }

    /// Snapshot of the session counters
    pub fn stats(&self) -> SessionStats {
        self.shared.stats()
    }

    /// Stop the session, join the writer and release the buffer
    ///
    /// The writer can only observe the request between messages. A device
    /// source blocked in a read has to be ended by the caller first (for
    /// example by killing the bridge process). All channels must be closed
    /// and dropped before this is called.
    pub fn destroy(mut self) {
        let open = self.shared.open_channels.load(Ordering::Acquire);
        if open > 0 {
            tracing::warn!(session_id = self.id(), open_channels = open, "Session destroyed with open channels");
        }
        debug_assert_eq!(open, 0, "session destroyed with open channels");

        self.shutdown(true);
        tracing::info!(session_id = self.id(), "Session destroyed");
    }

    fn shutdown(&mut self, join: bool) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.set_active(false);

        let Some(handle) = self.writer.get_mut().take() else {
            return;
        };

        if !join && !handle.is_finished() {
            tracing::debug!(session_id = self.id(), "Detaching writer thread still blocked in read");
            return;
        }

        match handle.join() {
            Ok(exit) => tracing::debug!(session_id = self.id(), exit = ?exit, "Writer joined"),
            Err(_) => tracing::warn!(session_id = self.id(), "Writer thread panicked"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown(false);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("started", &self.writer.lock().is_some())
            .finish()
    }
}
