use std::path::PathBuf;

use crate::category::Category;
use crate::query::FilterState;
use crate::state::LoadStatus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub source: Option<PathBuf>,
    pub load: LoadStatus,
    pub filter: FilterState,
    pub visible: Vec<usize>,
    pub category_counts: Vec<(Category, usize)>,
    pub status_message: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    /// e.g. `42/310 entries (loading 310)`.
    pub fn summary_line(&self) -> String {
        let total = self.load.entry_count();
        let mut line = format!("{}/{} entries", self.visible.len(), total);
        match &self.load {
            LoadStatus::Loading { .. } => line.push_str(&format!(" (loading {total})")),
            LoadStatus::Failed { .. } => line.push_str(" (partial)"),
            LoadStatus::Idle | LoadStatus::Loaded { .. } => {}
        }
        line
    }
}
