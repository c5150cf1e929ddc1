use std::path::PathBuf;

use crate::category::Category;
use crate::query::FilterState;
use crate::view_model::AppViewModel;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading { count: usize },
    Loaded { total: usize },
    Failed { message: String, ingested: usize },
}

impl LoadStatus {
    pub fn entry_count(&self) -> usize {
        match self {
            LoadStatus::Idle => 0,
            LoadStatus::Loading { count } => *count,
            LoadStatus::Loaded { total } => *total,
            LoadStatus::Failed { ingested, .. } => *ingested,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    source: Option<PathBuf>,
    load: LoadStatus,
    filter: FilterState,
    visible: Vec<usize>,
    category_counts: Vec<(Category, usize)>,
    status_message: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            source: self.source.clone(),
            load: self.load.clone(),
            filter: self.filter.clone(),
            visible: self.visible.clone(),
            category_counts: self.category_counts.clone(),
            status_message: self.status_message.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn filter_mut(&mut self) -> &mut FilterState {
        self.dirty = true;
        &mut self.filter
    }

    pub(crate) fn begin_load(&mut self, path: PathBuf) {
        self.source = Some(path);
        self.load = LoadStatus::Loading { count: 0 };
        self.visible.clear();
        self.category_counts.clear();
        self.status_message = None;
        self.dirty = true;
    }

    pub(crate) fn set_load_status(&mut self, load: LoadStatus) {
        if self.load != load {
            self.load = load;
            self.dirty = true;
        }
    }

    pub(crate) fn set_visible(&mut self, visible: Vec<usize>, counts: Vec<(Category, usize)>) {
        if self.visible != visible || self.category_counts != counts {
            self.visible = visible;
            self.category_counts = counts;
            self.dirty = true;
        }
    }

    pub(crate) fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.dirty = true;
    }
}
