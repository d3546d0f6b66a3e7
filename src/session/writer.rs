//! Writer thread
//!
//! The only code that appends to a session's ring buffer. It blocks inside
//! the backend read, so it notices a shutdown request only between
//! messages.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::BytesMut;

use super::shared::Shared;
use crate::backend::Backend;
use crate::error::{Error, TransportError};

/// Why the writer loop ended
#[derive(Debug)]
pub(crate) enum WriterExit {
    /// Source reported a clean end of stream
    EndOfStream,
    /// Session asked the writer to stop
    Shutdown,
    /// Source failed; no further records can be read
    Failed(Error),
}

/// Marks the session exhausted when the writer leaves `run`, including by
/// unwinding, so parked readers are always released.
struct ExhaustOnExit<'a>(&'a Shared);

impl Drop for ExhaustOnExit<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!(session_id = self.0.id, "Writer panicked, releasing readers");
        }
        self.0.mark_exhausted();
    }
}

pub(crate) fn run(shared: Arc<Shared>, mut backend: Backend) -> WriterExit {
    let _exhaust = ExhaustOnExit(&*shared);
    let mut record = BytesMut::new();

    let exit = loop {
        if shared.shutdown.load(Ordering::Acquire) {
            break WriterExit::Shutdown;
        }

        let mut msg = match backend.read_message() {
            Ok(Some(msg)) => msg,
            Ok(None) => break WriterExit::EndOfStream,
            Err(e) => break WriterExit::Failed(e),
        };

        msg.pname = backend.resolve_pid_name(msg.pid);
        record.clear();
        msg.encode_record(&mut record);

        if let Err(e) = shared.append(&record) {
            tracing::warn!(
                session_id = shared.id,
                pid = msg.pid,
                error = %e,
                "Dropped oversized record"
            );
        }
    };

    match &exit {
        WriterExit::EndOfStream => {
            tracing::info!(session_id = shared.id, backend = backend.kind(), "Source reached end of stream")
        }
        WriterExit::Shutdown => {
            tracing::info!(session_id = shared.id, backend = backend.kind(), "Writer shut down")
        }
        WriterExit::Failed(Error::Transport(TransportError::FramingLost { len, capacity })) => {
            tracing::warn!(
                session_id = shared.id,
                len,
                capacity,
                "Framing lost, stopping ingestion"
            )
        }
        WriterExit::Failed(e) => {
            tracing::warn!(session_id = shared.id, error = %e, "Source failed, stopping ingestion")
        }
    }

    backend.close();
    exit
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use bytes::BytesMut;

    use super::*;
    use crate::backend::{DummyConfig, FileBackend};
    use crate::message::Message;
    use crate::protocol::{FrameHeader, TransportConfig};

    #[test]
    fn test_runs_to_end_of_stream() {
        let shared = Arc::new(Shared::new(1, 64 * 1024));
        let backend = Backend::dummy(DummyConfig::default().interval(Duration::ZERO).limit(10));

        let exit = run(shared.clone(), backend);
        assert!(matches!(exit, WriterExit::EndOfStream));

        let inner = shared.state.read();
        assert!(inner.exhausted);
        assert_eq!(inner.ring.len(), 10);

        let msg = Message::decode_record(1, inner.ring.get(1).unwrap()).unwrap();
        assert_eq!(msg.pname, format!("dummy-{}", msg.pid));
    }

    #[test]
    fn test_framing_loss_ends_ingestion() {
        let mut raw = BytesMut::new();
        FrameHeader {
            len: 200,
            ..Default::default()
        }
        .encode(&mut raw);
        raw.extend_from_slice(&[1u8; 200]);

        let config = TransportConfig::raw().max_payload_size(100);
        let backend = FileBackend::with_config(Cursor::new(raw.to_vec()), config).into();
        let shared = Arc::new(Shared::new(1, 1024));

        let exit = run(shared.clone(), backend);
        assert!(matches!(
            exit,
            WriterExit::Failed(Error::Transport(TransportError::FramingLost { .. }))
        ));
        assert!(shared.state.read().exhausted);
        assert!(shared.state.read().ring.is_empty());
    }

    #[test]
    fn test_oversized_record_dropped() {
        let mut raw = BytesMut::new();
        for len in [10u16, 300, 10] {
            FrameHeader {
                len,
                ..Default::default()
            }
            .encode(&mut raw);
            raw.extend_from_slice(&vec![b'x'; len as usize]);
        }

        let backend = FileBackend::from_reader(Cursor::new(raw.to_vec())).into();
        let shared = Arc::new(Shared::new(1, 128));

        let exit = run(shared.clone(), backend);
        assert!(matches!(exit, WriterExit::EndOfStream));

        let stats = shared.stats();
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.records_dropped, 1);
    }

    #[test]
    fn test_panicking_source_still_exhausts() {
        struct Exploding;

        impl std::io::Read for Exploding {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                panic!("source exploded");
            }
        }

        let shared = Arc::new(Shared::new(1, 1024));
        shared.set_active(true);
        let backend: Backend = FileBackend::from_reader(Exploding).into();

        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || run(shared, backend))
        };
        assert!(worker.join().is_err());

        let inner = shared.state.read();
        assert!(inner.exhausted);
        assert!(inner.ring.is_empty());
    }

    #[test]
    fn test_shutdown_flag() {
        let shared = Arc::new(Shared::new(1, 1024));
        shared.shutdown.store(true, Ordering::Release);
        let backend = Backend::dummy(DummyConfig::default().interval(Duration::ZERO));

        assert!(matches!(run(shared.clone(), backend), WriterExit::Shutdown));
        assert!(shared.state.read().exhausted);
    }
}
