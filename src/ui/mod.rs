//! Terminal presentation layer: per-screen state holders plus the Ratatui
//! drawing and event-loop glue that binds to them.

pub mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
