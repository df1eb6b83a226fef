//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. The intent is that these types stay light-weight data holders so other
//! layers can focus on presentation and persistence logic.

use std::fmt;

use chrono::NaiveDateTime;

/// Format used whenever an appointment timestamp is shown to the user or
/// parsed back from an input field. Kept in one place so the booking and
/// management screens cannot drift apart.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
/// A doctor the office can book appointments with. The availability flag is
/// maintained by hand in the database; it means "generally bookable", not
/// "free at a particular time".
pub struct Doctor {
    /// Primary key from the database. Kept around even when the UI only needs
    /// display information because the booking flow bubbles the id back to
    /// the persistence layer.
    pub id: i64,
    /// Name shown in lists and joined into appointment rows.
    pub full_name: String,
    /// Medical specialty, also used as a filter field.
    pub specialty: String,
    /// Manually maintained bookability flag.
    pub available: bool,
}

impl fmt::Display for Doctor {
    /// Write `name (specialty)` to any formatter so the type plays nicely
    /// with Ratatui widgets that consume strings implicitly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name, self.specialty)
    }
}

#[derive(Debug, Clone)]
/// A patient appointments are booked for.
pub struct Patient {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// Name shown in lists and joined into appointment rows.
    pub full_name: String,
    /// Contact address, display only.
    pub email: String,
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

#[derive(Debug, Clone)]
/// One booked slot. The doctor and patient names are denormalized at read
/// time via joins so the management screen can render rows without extra
/// queries; they are never stored.
pub struct Appointment {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// References `doctors.id`.
    pub doctor_id: i64,
    /// References `patients.id`.
    pub patient_id: i64,
    /// When the appointment takes place. Unique per doctor.
    pub scheduled_at: NaiveDateTime,
    /// Free-form notes entered at booking time, bounded by the form layer.
    pub notes: Option<String>,
    /// Joined from the doctors table at read time.
    pub doctor_name: String,
    /// Joined from the patients table at read time.
    pub patient_name: String,
}

impl Appointment {
    /// Compose the `date  doctor - notes` line the management screen lists,
    /// gracefully omitting the separator when there are no notes.
    pub fn summary(&self) -> String {
        let base = format!(
            "{}  {}",
            self.scheduled_at.format(DATE_FORMAT),
            self.doctor_name
        );
        match self.notes.as_deref().map(str::trim) {
            Some(notes) if !notes.is_empty() => format!("{base} - {notes}"),
            _ => base,
        }
    }
}
