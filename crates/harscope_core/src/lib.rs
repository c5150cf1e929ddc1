//! Harscope core: HAR entry model, index, filter engine, timeline projection
//! and the pure UI state machine.
mod category;
mod datetime;
mod effect;
mod entry;
mod index;
mod msg;
mod query;
mod state;
mod timeline;
mod update;
mod view_model;

pub use category::{
    classify, is_cors_failure, Category, CategoryParseError, CategoryRule, CorsRule, RuleInput,
    CATEGORY_RULES, CORS_RULES,
};
pub use datetime::{parse_har_datetime, DateTimeError};
pub use effect::Effect;
pub use entry::{
    lenient_path, Content, Cookie, Entry, Header, PostData, Request, Response, Timings, UrlParts,
};
pub use index::{matches_text, DimensionKey, EntryIndex, MAX_SEARCHABLE_BODY};
pub use msg::Msg;
pub use query::{evaluate, evaluate_naive, intersect, CategoryFilter, FilterState};
pub use state::{AppState, LoadStatus};
pub use timeline::{
    bar_width, format_elapsed, phase_segments, project, ticks, Phase, PhaseSegment, Regime, Tick,
    TimelineProjection, TimelineRow, TICK_COUNT,
};
pub use update::update;
pub use view_model::AppViewModel;
