//! Binary entry point that glues the SQLite-backed scheduling data to the
//! TUI: bring up the database, seed the reference roster on first run, and
//! drive the Ratatui event loop until the user exits.

use medsched::{ensure_schema, run_app, seed_reference_data, App, DbConfig};

/// Initialize persistence, seed reference data, and launch the event loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for
/// example an unwritable home directory) to the terminal instead of
/// crashing silently.
fn main() -> anyhow::Result<()> {
    let conn = ensure_schema(&DbConfig::default())?;
    seed_reference_data(&conn)?;

    let mut app = App::new(conn);
    run_app(&mut app)
}
