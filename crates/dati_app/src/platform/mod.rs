//! Terminal platform: configuration, effect execution, input and rendering.
mod app;
mod config;
mod effects;
mod ui;

pub use app::run_app;
