use std::io;
use std::path::PathBuf;
use std::time::Duration;

use harscope_core::{Effect, Msg};
use harscope_engine::{
    export_filtered, EngineEvent, EngineHandle, EntryStore, ExportOptions, IngestEvent,
    IngestSettings, LoadHandle,
};
use harscope_logging::{har_debug, har_info, har_warn};

/// Executes effects against the engine and turns engine events back into
/// messages for the state machine.
pub struct EffectRunner {
    engine: EngineHandle,
    current: Option<LoadHandle>,
    export_dir: Option<PathBuf>,
    export_options: ExportOptions,
}

impl EffectRunner {
    pub fn new(settings: IngestSettings, export_dir: Option<PathBuf>) -> io::Result<Self> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
            current: None,
            export_dir,
            export_options: ExportOptions::default(),
        })
    }

    pub fn store(&self) -> Option<&EntryStore> {
        self.current.as_ref().map(|load| load.store.as_ref())
    }

    /// Runs `effects` in order. Effects answered synchronously return their
    /// follow-up messages.
    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_up = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartLoad { path } => {
                    if let Some(previous) = self.current.take() {
                        previous.cancel();
                    }
                    let load = self.engine.load(path.clone());
                    har_info!("StartLoad load_id={} path={:?}", load.load_id, path);
                    self.current = Some(load);
                }
                Effect::Evaluate { filter } => {
                    if let Some(store) = self.store() {
                        let positions = store.evaluate(&filter);
                        har_debug!("Evaluate {:?} -> {} rows", filter, positions.len());
                        follow_up.push(Msg::FilterEvaluated {
                            positions,
                            category_counts: store.category_counts(),
                        });
                    }
                }
                Effect::ExportFiltered {
                    positions,
                    filename,
                } => follow_up.push(Msg::ExportFinished(self.export(&positions, &filename))),
            }
        }
        follow_up
    }

    fn export(&self, positions: &[usize], filename: &str) -> Result<PathBuf, String> {
        let store = self.store().ok_or("no archive loaded")?;
        let dir = self.export_dir.as_deref().ok_or("no export directory")?;
        export_filtered(store, positions, dir, filename, &self.export_options)
            .map(|summary| summary.output_path)
            .map_err(|err| {
                har_warn!("Export of {} failed: {}", filename, err);
                err.to_string()
            })
    }

    /// Waits up to `timeout` for the next engine event of the current load.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        let current = self.current.as_ref()?.load_id;
        map_event(current, event)
    }
}

/// Events from superseded loads are dropped.
pub fn map_event(current: u64, event: EngineEvent) -> Option<Msg> {
    if event.load_id != current {
        return None;
    }
    let msg = match event.event {
        IngestEvent::Started { .. } => Msg::LoadStarted,
        IngestEvent::EntriesAdded { first, count } => Msg::EntriesAdded {
            total: first + count,
        },
        IngestEvent::Progress { count } => Msg::LoadProgress { count },
        IngestEvent::Completed { total } => Msg::LoadCompleted { total },
        IngestEvent::Failed { error, ingested } => {
            har_warn!("Load {} failed: {}", current, error);
            Msg::LoadFailed {
                message: error.to_string(),
                ingested,
            }
        }
    };
    Some(msg)
}
