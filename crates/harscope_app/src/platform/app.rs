use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use harscope_core::{update, AppState, CategoryFilter, LoadStatus, Msg};
use harscope_engine::IngestSettings;
use harscope_logging::{har_info, LogDestination};
use log::LevelFilter;

use super::args::Options;
use super::effects::EffectRunner;
use super::render;

const EVENT_POLL: Duration = Duration::from_millis(75);

pub fn run_app(options: Options) -> anyhow::Result<()> {
    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    harscope_logging::initialize(LogDestination::File, level, Path::new("./harscope.log"));
    har_info!("harscope starting with {:?}", options);

    let runner = EffectRunner::new(IngestSettings::default(), options.export_dir.clone())
        .context("could not start the ingestion engine")?;
    let mut app = App::new(runner);

    app.dispatch(Msg::LoadRequested(options.path.clone()));
    while app.state.load_status().is_loading() {
        match app.runner.next_msg(EVENT_POLL) {
            Some(msg) => app.dispatch(msg),
            None => app.dispatch(Msg::Tick),
        }
    }
    eprintln!();

    if let LoadStatus::Failed { message, ingested } = app.state.load_status() {
        if *ingested == 0 {
            anyhow::bail!("could not load {}: {message}", options.path.display());
        }
    }

    if let Some(text) = &options.filter {
        app.dispatch(Msg::FilterTextChanged(text.clone()));
    }
    if options.category != CategoryFilter::All {
        app.dispatch(Msg::CategorySelected(options.category));
    }
    if options.errors_only {
        app.dispatch(Msg::ErrorsOnlyToggled);
    }
    if options.slowest_first {
        app.dispatch(Msg::SortByDurationToggled);
    }

    let view = app.state.view();
    let store = app
        .runner
        .store()
        .context("engine did not start a load")?;
    let projection = store.project_timeline(&view.visible, usize::from(options.chart_width));

    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", render::render_list(&view, store))?;
    writeln!(stdout)?;
    write!(stdout, "{}", render::render_timeline(&projection, store))?;

    if options.export_dir.is_some() {
        app.dispatch(Msg::ExportRequested {
            now: Local::now().naive_local(),
        });
    }
    if let Some(message) = app.state.view().status_message {
        writeln!(stdout, "\n{message}")?;
    }
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    /// Feeds `msg` and every follow-up message through the update function.
    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            if state.consume_dirty() {
                let view = state.view();
                eprint!("\r{}", view.summary_line());
            }
            self.state = state;
            inbox.extend(self.runner.run(effects));
        }
    }
}
