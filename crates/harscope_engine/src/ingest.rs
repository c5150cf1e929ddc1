use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use harscope_logging::{har_debug, har_info, har_warn};
use tokio_util::sync::CancellationToken;

use crate::store::EntryStore;
use crate::stream::{stream_entries, LogMeta};
use crate::{EngineEvent, IngestEvent, LoadError, LoadFailureKind, LoadId};

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Entries per `EntriesAdded` notification. Bounds the redraw rate.
    pub batch_size: usize,
    /// Entries between `Progress` notifications.
    pub progress_interval: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            progress_interval: 50,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: IngestEvent);
}

pub struct ChannelEventSink {
    load_id: LoadId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(load_id: LoadId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { load_id, tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: IngestEvent) {
        let _ = self.tx.send(EngineEvent {
            load_id: self.load_id,
            event,
        });
    }
}

/// Streams the archive at `path` into `store` on the blocking pool.
///
/// Emits `Started`, batches and progress, then exactly one terminal event.
/// Returns the number of entries ingested, or the error that was reported.
pub async fn ingest_file(
    path: PathBuf,
    store: Arc<EntryStore>,
    settings: IngestSettings,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) -> Result<usize, LoadError> {
    sink.emit(IngestEvent::Started { path: path.clone() });
    har_info!("Loading HAR from {:?}", path);

    let task_store = store.clone();
    let task_sink = sink.clone();
    let task = tokio::task::spawn_blocking(move || match File::open(&path) {
        Ok(file) => ingest_reader(
            BufReader::new(file),
            &task_store,
            &settings,
            task_sink.as_ref(),
            &cancel,
        ),
        Err(err) => {
            let error = LoadError::new(LoadFailureKind::Io, format!("{}: {err}", path.display()));
            report(task_sink.as_ref(), Err(error.clone()), 0);
            Err(error)
        }
    });

    match task.await {
        Ok(result) => result,
        Err(join_err) => {
            // The task died before reporting; report on its behalf.
            let error = LoadError::new(LoadFailureKind::Interrupted, join_err.to_string());
            report(sink.as_ref(), Err(error.clone()), store.len());
            Err(error)
        }
    }
}

/// Blocking core of the ingestor. Emits batches, progress and the terminal
/// event for everything read from `reader`.
pub fn ingest_reader<R: Read>(
    reader: R,
    store: &EntryStore,
    settings: &IngestSettings,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<usize, LoadError> {
    let batch_size = settings.batch_size.max(1);
    let progress_interval = settings.progress_interval.max(1);

    let mut meta = LogMeta::default();
    let mut count = 0usize;
    let mut batch_first = store.len();
    let mut batch_len = 0usize;
    let mut stopped = false;

    let streamed = stream_entries(reader, &mut meta, &mut |entry, raw| {
        if cancel.is_cancelled() {
            stopped = true;
            return ControlFlow::Break(());
        }
        let position = store.append(entry, raw);
        count += 1;
        batch_len += 1;

        if batch_len >= batch_size {
            har_debug!("Ingested batch {}..{}", batch_first, position + 1);
            sink.emit(IngestEvent::EntriesAdded {
                first: batch_first,
                count: batch_len,
            });
            batch_first = position + 1;
            batch_len = 0;
        }
        if count % progress_interval == 0 {
            sink.emit(IngestEvent::Progress { count });
        }
        ControlFlow::Continue(())
    });

    // Metadata and the partial batch are published whatever the outcome.
    store.set_meta(meta);
    if batch_len > 0 {
        sink.emit(IngestEvent::EntriesAdded {
            first: batch_first,
            count: batch_len,
        });
    }
    sink.emit(IngestEvent::Progress { count });

    let result = match streamed {
        Ok(()) => Ok(count),
        // Only our own break is a cancellation; a late cancel does not
        // relabel a decode error.
        Err(_) if stopped => Err(LoadError::new(
            LoadFailureKind::Cancelled,
            "ingestion cancelled",
        )),
        Err(err) => Err(LoadError::from_json(&err)),
    };
    report(sink, result.clone(), count);
    result
}

fn report(sink: &dyn EventSink, result: Result<usize, LoadError>, ingested: usize) {
    match result {
        Ok(total) => {
            har_info!("HAR load complete: {} entries", total);
            sink.emit(IngestEvent::Completed { total });
        }
        Err(error) => {
            har_warn!("HAR load failed after {} entries: {}", ingested, error);
            sink.emit(IngestEvent::Failed { error, ingested });
        }
    }
}
