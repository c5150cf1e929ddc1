use crate::{AppState, Effect, LoadStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::LoadRequested(path) => {
            // A request while streaming supersedes the running load; the
            // effect runner cancels it.
            state.begin_load(path.clone());
            vec![Effect::StartLoad { path }]
        }
        Msg::LoadStarted => {
            if !state.load_status().is_loading() {
                state.set_load_status(LoadStatus::Loading { count: 0 });
            }
            Vec::new()
        }
        Msg::EntriesAdded { total } => {
            if state.load_status().is_loading() {
                state.set_load_status(LoadStatus::Loading { count: total });
            }
            evaluate(&state)
        }
        Msg::LoadProgress { count } => {
            if state.load_status().is_loading() {
                state.set_load_status(LoadStatus::Loading { count });
            }
            Vec::new()
        }
        Msg::LoadCompleted { total } => {
            state.set_load_status(LoadStatus::Loaded { total });
            state.set_status_message("Loading complete!");
            evaluate(&state)
        }
        Msg::LoadFailed { message, ingested } => {
            state.set_status_message(format!("Loading error: {message}"));
            state.set_load_status(LoadStatus::Failed { message, ingested });
            evaluate(&state)
        }
        Msg::FilterTextChanged(text) => {
            if state.filter().text == text {
                return (state, Vec::new());
            }
            state.filter_mut().set_text_filter(text);
            evaluate(&state)
        }
        Msg::CategorySelected(category) => {
            if state.filter().category == category {
                return (state, Vec::new());
            }
            state.filter_mut().set_category_filter(category);
            evaluate(&state)
        }
        Msg::ErrorsOnlyToggled => {
            state.filter_mut().toggle_errors_only();
            evaluate(&state)
        }
        Msg::SortByDurationToggled => {
            state.filter_mut().toggle_sort_by_duration();
            evaluate(&state)
        }
        Msg::FiltersReset => {
            if state.filter().is_default() {
                return (state, Vec::new());
            }
            state.filter_mut().reset();
            evaluate(&state)
        }
        Msg::FilterEvaluated {
            positions,
            category_counts,
        } => {
            state.set_visible(positions, category_counts);
            Vec::new()
        }
        Msg::ExportRequested { now } => {
            if state.visible().is_empty() {
                state.set_status_message("Nothing to export");
                return (state, Vec::new());
            }
            let original = state
                .source()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "export.har".to_string());
            let filename = state.filter().export_filename(&original, now);
            vec![Effect::ExportFiltered {
                positions: state.visible().to_vec(),
                filename,
            }]
        }
        Msg::ExportFinished(result) => {
            match result {
                Ok(path) => state.set_status_message(format!("Saved {}", path.display())),
                Err(message) => state.set_status_message(format!("Export failed: {message}")),
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Nothing to evaluate until a load has begun.
fn evaluate(state: &AppState) -> Vec<Effect> {
    if state.source().is_none() {
        return Vec::new();
    }
    vec![Effect::Evaluate {
        filter: state.filter().clone(),
    }]
}
