//! Harscope engine: streaming ingestion into a shared entry store, the
//! background command/event bridge and filtered export.
mod engine;
mod export;
mod ingest;
mod persist;
mod store;
mod stream;
mod types;

pub use engine::{EngineHandle, LoadHandle};
pub use export::{
    curl_command, export_filtered, filtered_har_json, markdown_summary, ExportError,
    ExportOptions, ExportSummary, DEFAULT_HAR_VERSION,
};
pub use ingest::{ingest_file, ingest_reader, ChannelEventSink, EventSink, IngestSettings};
pub use persist::{write_archive, PersistError};
pub use store::EntryStore;
pub use stream::LogMeta;
pub use types::{EngineEvent, IngestEvent, LoadError, LoadFailureKind, LoadId};
