use std::path::PathBuf;

use crate::query::FilterState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin streaming the archive at `path` into a fresh store.
    StartLoad { path: PathBuf },
    /// Recompute the visible positions against the store.
    Evaluate { filter: FilterState },
    /// Write the given positions as a new archive.
    ExportFiltered {
        positions: Vec<usize>,
        filename: String,
    },
}
