//! Core library surface for the medsched scheduling application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: plain domain records, the SQLite persistence layer with its
//! booking rules, and the terminal UI state holders.

pub mod db;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer. These are typically
/// used by `main.rs` to initialize the embedded SQLite store.
pub use db::{ensure_schema, seed_reference_data, BookingError, DbConfig};

/// The domain types that other layers manipulate.
pub use models::{Appointment, Doctor, Patient};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
