//! Shared entry store: the entries, their raw JSON and the index behind one
//! reader/writer lock.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use harscope_core::{
    evaluate, project, Category, DimensionKey, Entry, EntryIndex, FilterState, TimelineProjection,
};
use serde_json::value::RawValue;

use crate::stream::LogMeta;

#[derive(Default)]
struct StoreInner {
    entries: Vec<Entry>,
    raw: Vec<Box<RawValue>>,
    index: EntryIndex,
    meta: LogMeta,
}

/// Append-only store for one load. The ingestor is the only writer; append
/// and indexing happen under the same write lock, so readers never see an
/// entry without its index records or the reverse.
#[derive(Default)]
pub struct EntryStore {
    inner: RwLock<StoreInner>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `entry` and indexes it; returns its position.
    pub fn append(&self, entry: Entry, raw: Box<RawValue>) -> usize {
        let mut inner = self.write();
        let position = inner.entries.len();
        inner.index.add_entry(&entry, position);
        inner.entries.push(entry);
        inner.raw.push(raw);
        position
    }

    pub(crate) fn set_meta(&self, meta: LogMeta) {
        self.write().meta = meta;
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, position: usize) -> Option<Entry> {
        self.read().entries.get(position).cloned()
    }

    /// `log.version` of the source document, once seen.
    pub fn version(&self) -> Option<String> {
        self.read().meta.version.clone()
    }

    /// Runs `f` against a consistent snapshot of entries and index.
    pub fn read_with<R>(&self, f: impl FnOnce(&[Entry], &EntryIndex) -> R) -> R {
        let inner = self.read();
        f(&inner.entries, &inner.index)
    }

    /// Visible positions for `filter`, computed fresh.
    pub fn evaluate(&self, filter: &FilterState) -> Vec<usize> {
        self.read_with(|entries, index| evaluate(filter, entries, index))
    }

    pub fn positions(&self, key: DimensionKey<'_>) -> Vec<usize> {
        self.read().index.get(key)
    }

    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        self.read().index.category_counts()
    }

    pub fn project_timeline(&self, positions: &[usize], chart_width: usize) -> TimelineProjection {
        self.read_with(|entries, _| project(entries, positions, chart_width))
    }

    /// Raw JSON of the given positions (out-of-range positions are skipped)
    /// plus the document metadata.
    pub(crate) fn raw_selection(&self, positions: &[usize]) -> (LogMeta, Vec<Box<RawValue>>) {
        let inner = self.read();
        let raw = positions
            .iter()
            .filter_map(|&position| inner.raw.get(position).cloned())
            .collect();
        (inner.meta.clone(), raw)
    }
}
