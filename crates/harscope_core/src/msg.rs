use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::category::Category;
use crate::query::CategoryFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to open an archive.
    LoadRequested(PathBuf),
    /// Engine accepted the load and began streaming.
    LoadStarted,
    /// A batch of entries landed in the store.
    EntriesAdded { total: usize },
    /// Periodic entry count from the ingestor.
    LoadProgress { count: usize },
    /// Ingestion finished; the store is final.
    LoadCompleted { total: usize },
    /// Ingestion aborted; entries ingested so far stay usable.
    LoadFailed { message: String, ingested: usize },
    /// User edited the search box.
    FilterTextChanged(String),
    /// User picked a category from the filter bar.
    CategorySelected(CategoryFilter),
    ErrorsOnlyToggled,
    SortByDurationToggled,
    FiltersReset,
    /// Result of an `Effect::Evaluate`, with per-category counts for the bar.
    FilterEvaluated {
        positions: Vec<usize>,
        category_counts: Vec<(Category, usize)>,
    },
    /// User asked to save the visible entries. `now` stamps the filename.
    ExportRequested { now: NaiveDateTime },
    /// Export finished; `Err` carries the message.
    ExportFinished(Result<PathBuf, String>),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
