use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use harscope_logging::har_error;
use tokio_util::sync::CancellationToken;

use crate::ingest::{ingest_file, ChannelEventSink, EventSink, IngestSettings};
use crate::store::EntryStore;
use crate::{EngineEvent, LoadId};

enum EngineCommand {
    Load {
        load_id: LoadId,
        path: PathBuf,
        store: Arc<EntryStore>,
        cancel: CancellationToken,
    },
}

/// A load in flight. The store is readable at any time; entries appear as
/// they are decoded.
#[derive(Clone)]
pub struct LoadHandle {
    pub load_id: LoadId,
    pub store: Arc<EntryStore>,
    cancel: CancellationToken,
}

impl LoadHandle {
    /// Stops ingestion after the current entry. Already ingested entries stay.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Owns the background runtime that runs ingestion and forwards its events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    next_load_id: AtomicU64,
}

impl EngineHandle {
    /// Fails when the ingestion runtime cannot be built; no load could ever
    /// report back otherwise.
    pub fn new(settings: IngestSettings) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new().inspect_err(|err| {
            har_error!("Failed to start ingestion runtime: {}", err);
        })?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let settings = settings.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(command, settings, event_tx).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            next_load_id: AtomicU64::new(1),
        })
    }

    /// Starts streaming `path` into a fresh store.
    pub fn load(&self, path: impl Into<PathBuf>) -> LoadHandle {
        let load_id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
        let handle = LoadHandle {
            load_id,
            store: Arc::new(EntryStore::new()),
            cancel: CancellationToken::new(),
        };
        let _ = self.cmd_tx.send(EngineCommand::Load {
            load_id,
            path: path.into(),
            store: handle.store.clone(),
            cancel: handle.cancel.clone(),
        });
        handle
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    command: EngineCommand,
    settings: IngestSettings,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Load {
            load_id,
            path,
            store,
            cancel,
        } => {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(load_id, event_tx));
            // Outcome already reported through the sink.
            let _ = ingest_file(path, store, settings, sink, cancel).await;
        }
    }
}
