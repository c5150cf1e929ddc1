pub mod args;
mod app;
mod effects;
mod render;

pub use app::run_app;
