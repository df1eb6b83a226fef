//! Persistence module split across logical submodules. Every query lives
//! here so the UI layer can stay focused on state management.

mod appointments;
pub(crate) mod connection;
mod doctors;
mod patients;

use thiserror::Error;

pub use appointments::{
    book_appointment, delete_appointment, fetch_appointments_for_patient, reschedule_appointment,
};
pub use connection::{ensure_schema, seed_reference_data, DbConfig};
pub use doctors::fetch_doctors;
pub use patients::fetch_patients;

/// Why a booking (or reschedule) was refused. The business rules get their
/// own kinds so the screens can branch on them instead of matching on
/// message strings; plain store failures tunnel through `Database`.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Doctor {0} was not found.")]
    DoctorNotFound(i64),

    #[error("The selected doctor is not accepting appointments.")]
    DoctorUnavailable(i64),

    #[error("This time slot is already booked for the selected doctor.")]
    SlotTaken,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
