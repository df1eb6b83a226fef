//! One state holder per workflow. Each owns its lists, selections, input
//! fields, loading flag, and footer status, and talks to the persistence
//! layer directly; the drawing code in `app.rs` only ever reads from these.
//!
//! Reloads triggered by field edits or selection moves are explicit method
//! calls on the edit path (`push_filter_char` reloads the doctor list, a
//! patient cursor move reloads that patient's appointments) so the trigger
//! stays visible and testable instead of hiding in a binding framework.

use anyhow::Result;
use chrono::NaiveDateTime;
use ratatui::style::{Color, Style};
use rusqlite::Connection;

use crate::db::{
    book_appointment, delete_appointment, fetch_appointments_for_patient, fetch_doctors,
    fetch_patients, reschedule_appointment, BookingError,
};
use crate::models::{Appointment, Doctor, Patient};

use super::forms::{DateInput, DoctorFilters, NotesInput};
use super::helpers::surface_error;

/// Holds the footer message text plus its severity.
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) kind: StatusKind,
}

impl StatusMessage {
    pub(crate) fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub(crate) fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }
}

/// Severity levels shown in the footer.
pub(crate) enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    pub(crate) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Translate a booking refusal into footer text. Business-rule kinds carry
/// their own user-facing message; plain store failures get the generic
/// prefix the other operations use.
fn booking_status(err: BookingError) -> StatusMessage {
    match err {
        BookingError::Database(cause) => {
            StatusMessage::error(format!("Error booking appointment: {cause}"))
        }
        rule => StatusMessage::error(rule.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Doctor browsing
// ---------------------------------------------------------------------------

/// State for the doctor list screen: two substring filters and the matching
/// doctors. Every filter edit reloads the list from the database.
pub(crate) struct DoctorsScreen {
    pub(crate) filters: DoctorFilters,
    pub(crate) doctors: Vec<Doctor>,
    pub(crate) selected: usize,
    pub(crate) loading: bool,
    pub(crate) status: Option<StatusMessage>,
}

impl DoctorsScreen {
    pub(crate) fn new(conn: &Connection) -> Self {
        let mut screen = Self {
            filters: DoctorFilters::default(),
            doctors: Vec::new(),
            selected: 0,
            loading: false,
            status: None,
        };
        screen.reload(conn);
        screen
    }

    /// Re-query the doctor list with the current filters. Failures become
    /// footer text; the previous list is kept on screen.
    pub(crate) fn reload(&mut self, conn: &Connection) {
        self.loading = true;
        let outcome = fetch_doctors(
            conn,
            self.filters.name_filter(),
            self.filters.specialty_filter(),
        );
        self.loading = false;

        match outcome {
            Ok(doctors) => {
                self.doctors = doctors;
                self.ensure_in_bounds();
                self.status = Some(StatusMessage::info(format!(
                    "{} doctor(s) match.",
                    self.doctors.len()
                )));
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!(
                    "Error loading doctors: {}",
                    surface_error(&err)
                )));
            }
        }
    }

    /// Append a character to the active filter and reload.
    pub(crate) fn push_filter_char(&mut self, conn: &Connection, ch: char) {
        if self.filters.push_char(ch) {
            self.reload(conn);
        }
    }

    /// Delete the last character of the active filter and reload.
    pub(crate) fn backspace_filter(&mut self, conn: &Connection) {
        if self.filters.backspace() {
            self.reload(conn);
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        move_cursor(&mut self.selected, self.doctors.len(), offset);
    }

    fn ensure_in_bounds(&mut self) {
        if self.doctors.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.doctors.len() {
            self.selected = self.doctors.len() - 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Appointment booking
// ---------------------------------------------------------------------------

/// Which control on the booking screen receives keystrokes.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum BookingFocus {
    Doctors,
    Patients,
    Date,
    Notes,
}

/// State for the booking screen. Doctors and patients are picked explicitly
/// (cursor plus a marked selection) so the "select both" validation mirrors
/// the nullable dropdowns it replaces.
pub(crate) struct BookingScreen {
    pub(crate) doctors: Vec<Doctor>,
    pub(crate) patients: Vec<Patient>,
    pub(crate) doctor_cursor: usize,
    pub(crate) patient_cursor: usize,
    pub(crate) selected_doctor: Option<i64>,
    pub(crate) selected_patient: Option<i64>,
    pub(crate) date: DateInput,
    pub(crate) notes: NotesInput,
    pub(crate) focus: BookingFocus,
    pub(crate) loading: bool,
    pub(crate) status: Option<StatusMessage>,
}

impl BookingScreen {
    pub(crate) fn new(conn: &Connection, now: NaiveDateTime) -> Self {
        let mut screen = Self {
            doctors: Vec::new(),
            patients: Vec::new(),
            doctor_cursor: 0,
            patient_cursor: 0,
            selected_doctor: None,
            selected_patient: None,
            date: DateInput::tomorrow(now),
            notes: NotesInput::default(),
            focus: BookingFocus::Doctors,
            loading: false,
            status: None,
        };
        screen.reload(conn);
        screen
    }

    /// Load the pickers. Only doctors whose availability flag is set are
    /// offered for booking; the flag is still re-checked inside the booking
    /// transaction because it can change between load and submit.
    pub(crate) fn reload(&mut self, conn: &Connection) {
        self.loading = true;
        let outcome = load_booking_lists(conn);
        self.loading = false;

        match outcome {
            Ok((doctors, patients)) => {
                self.doctors = doctors;
                self.patients = patients;
                self.doctor_cursor = 0;
                self.patient_cursor = 0;
                self.status = Some(StatusMessage::info("Data loaded successfully."));
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!(
                    "Error loading data: {}",
                    surface_error(&err)
                )));
            }
        }
    }

    pub(crate) fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            BookingFocus::Doctors => BookingFocus::Patients,
            BookingFocus::Patients => BookingFocus::Date,
            BookingFocus::Date => BookingFocus::Notes,
            BookingFocus::Notes => BookingFocus::Doctors,
        };
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        match self.focus {
            BookingFocus::Doctors => {
                move_cursor(&mut self.doctor_cursor, self.doctors.len(), offset);
            }
            BookingFocus::Patients => {
                move_cursor(&mut self.patient_cursor, self.patients.len(), offset);
            }
            BookingFocus::Date | BookingFocus::Notes => {}
        }
    }

    /// Mark the row under the cursor as the chosen doctor or patient.
    pub(crate) fn mark_selection(&mut self) {
        match self.focus {
            BookingFocus::Doctors => {
                self.selected_doctor = self.doctors.get(self.doctor_cursor).map(|d| d.id);
            }
            BookingFocus::Patients => {
                self.selected_patient = self.patients.get(self.patient_cursor).map(|p| p.id);
            }
            BookingFocus::Date | BookingFocus::Notes => {}
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        match self.focus {
            BookingFocus::Date => {
                self.date.push_char(ch);
            }
            BookingFocus::Notes => {
                self.notes.push_char(ch);
            }
            BookingFocus::Doctors | BookingFocus::Patients => {}
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.focus {
            BookingFocus::Date => self.date.backspace(),
            BookingFocus::Notes => self.notes.backspace(),
            BookingFocus::Doctors | BookingFocus::Patients => {}
        }
    }

    /// Validate the form and book. Client-side checks run before touching
    /// the database: both parties picked, date parseable and strictly in the
    /// future. On success the form resets for the next booking.
    pub(crate) fn submit(&mut self, conn: &Connection, now: NaiveDateTime) {
        let (Some(doctor_id), Some(patient_id)) = (self.selected_doctor, self.selected_patient)
        else {
            self.status = Some(StatusMessage::error(
                "Please select both a doctor and a patient.",
            ));
            return;
        };

        let scheduled_at = match self.date.parse_future(now) {
            Ok(when) => when,
            Err(err) => {
                self.status = Some(StatusMessage::error(err.to_string()));
                return;
            }
        };

        self.loading = true;
        let outcome = book_appointment(
            conn,
            doctor_id,
            patient_id,
            scheduled_at,
            self.notes.as_option(),
        );
        self.loading = false;

        match outcome {
            Ok(appointment) => {
                self.status = Some(StatusMessage::info(format!(
                    "Appointment booked with {} for {}.",
                    appointment.doctor_name, appointment.patient_name
                )));
                self.selected_doctor = None;
                self.selected_patient = None;
                self.date = DateInput::tomorrow(now);
                self.notes.clear();
            }
            Err(err) => self.status = Some(booking_status(err)),
        }
    }
}

/// The booking screen needs both pickers; failures on either surface as one
/// load error.
fn load_booking_lists(conn: &Connection) -> Result<(Vec<Doctor>, Vec<Patient>)> {
    let mut doctors = fetch_doctors(conn, None, None)?;
    doctors.retain(|doctor| doctor.available);
    let patients = fetch_patients(conn)?;
    Ok((doctors, patients))
}

// ---------------------------------------------------------------------------
// Appointment management
// ---------------------------------------------------------------------------

/// Which control on the management screen receives keystrokes.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum ManageFocus {
    Patients,
    Appointments,
    Date,
}

/// State for the reschedule/delete screen. Moving the patient cursor reloads
/// that patient's appointments; moving the appointment cursor copies its
/// date into the reschedule field.
pub(crate) struct ManageScreen {
    pub(crate) patients: Vec<Patient>,
    pub(crate) appointments: Vec<Appointment>,
    pub(crate) patient_cursor: usize,
    pub(crate) appointment_cursor: usize,
    pub(crate) date: DateInput,
    pub(crate) focus: ManageFocus,
    pub(crate) loading: bool,
    pub(crate) status: Option<StatusMessage>,
}

impl ManageScreen {
    pub(crate) fn new(conn: &Connection, now: NaiveDateTime) -> Self {
        let mut screen = Self {
            patients: Vec::new(),
            appointments: Vec::new(),
            patient_cursor: 0,
            appointment_cursor: 0,
            date: DateInput::tomorrow(now),
            focus: ManageFocus::Patients,
            loading: false,
            status: None,
        };
        screen.reload_patients(conn);
        screen
    }

    pub(crate) fn reload_patients(&mut self, conn: &Connection) {
        self.loading = true;
        let outcome = fetch_patients(conn);
        self.loading = false;

        match outcome {
            Ok(patients) => {
                self.patients = patients;
                if self.patient_cursor >= self.patients.len() {
                    self.patient_cursor = 0;
                }
                self.on_patient_selected(conn);
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!(
                    "Error loading patients: {}",
                    surface_error(&err)
                )));
            }
        }
    }

    pub(crate) fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            ManageFocus::Patients => ManageFocus::Appointments,
            ManageFocus::Appointments => ManageFocus::Date,
            ManageFocus::Date => ManageFocus::Patients,
        };
    }

    pub(crate) fn current_patient(&self) -> Option<&Patient> {
        self.patients.get(self.patient_cursor)
    }

    pub(crate) fn current_appointment(&self) -> Option<&Appointment> {
        self.appointments.get(self.appointment_cursor)
    }

    /// Move within whichever list has focus, firing the matching
    /// selection-changed hook.
    pub(crate) fn move_selection(&mut self, conn: &Connection, offset: isize) {
        match self.focus {
            ManageFocus::Patients => {
                if move_cursor(&mut self.patient_cursor, self.patients.len(), offset) {
                    self.on_patient_selected(conn);
                }
            }
            ManageFocus::Appointments => {
                if move_cursor(&mut self.appointment_cursor, self.appointments.len(), offset) {
                    self.on_appointment_selected();
                }
            }
            ManageFocus::Date => {}
        }
    }

    /// Selection-changed hook: reload the appointment list for the patient
    /// under the cursor.
    pub(crate) fn on_patient_selected(&mut self, conn: &Connection) {
        let Some(patient) = self.current_patient().cloned() else {
            self.appointments.clear();
            self.appointment_cursor = 0;
            return;
        };

        self.loading = true;
        let outcome = fetch_appointments_for_patient(conn, patient.id);
        self.loading = false;

        match outcome {
            Ok(appointments) => {
                self.appointments = appointments;
                self.appointment_cursor = 0;
                self.status = Some(StatusMessage::info(format!(
                    "Loaded {} appointment(s) for {}.",
                    self.appointments.len(),
                    patient.full_name
                )));
                self.on_appointment_selected();
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!(
                    "Error loading appointments: {}",
                    surface_error(&err)
                )));
            }
        }
    }

    /// Selection-changed hook: seed the reschedule field with the selected
    /// appointment's current date.
    pub(crate) fn on_appointment_selected(&mut self) {
        if let Some(appointment) = self.current_appointment() {
            let when = appointment.scheduled_at;
            self.date.set(when);
        }
    }

    pub(crate) fn push_date_char(&mut self, ch: char) {
        if self.focus == ManageFocus::Date {
            self.date.push_char(ch);
        }
    }

    pub(crate) fn backspace_date(&mut self) {
        if self.focus == ManageFocus::Date {
            self.date.backspace();
        }
    }

    /// Move the selected appointment to the date in the input field. The
    /// future-date rule applies here exactly as it does when booking.
    pub(crate) fn reschedule(&mut self, conn: &Connection, now: NaiveDateTime) {
        let Some(appointment_id) = self.current_appointment().map(|a| a.id) else {
            self.status = Some(StatusMessage::error(
                "Please select an appointment to update.",
            ));
            return;
        };

        let new_date = match self.date.parse_future(now) {
            Ok(when) => when,
            Err(err) => {
                self.status = Some(StatusMessage::error(err.to_string()));
                return;
            }
        };

        self.loading = true;
        let outcome = reschedule_appointment(conn, appointment_id, new_date);
        self.loading = false;

        match outcome {
            Ok(true) => {
                self.status = Some(StatusMessage::info("Appointment updated."));
                self.refresh_appointments(conn);
            }
            Ok(false) => {
                self.status = Some(StatusMessage::error(
                    "Failed to update appointment. Please try again.",
                ));
            }
            Err(err) => self.status = Some(booking_status(err)),
        }
    }

    /// Delete the selected appointment and refresh the list.
    pub(crate) fn delete(&mut self, conn: &Connection) {
        let Some(appointment_id) = self.current_appointment().map(|a| a.id) else {
            self.status = Some(StatusMessage::error(
                "Please select an appointment to delete.",
            ));
            return;
        };

        self.loading = true;
        let outcome = delete_appointment(conn, appointment_id);
        self.loading = false;

        match outcome {
            Ok(true) => {
                self.status = Some(StatusMessage::info("Appointment deleted."));
                self.refresh_appointments(conn);
            }
            Ok(false) => {
                self.status = Some(StatusMessage::error(
                    "Failed to delete appointment. Please try again.",
                ));
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!(
                    "Error deleting appointment: {}",
                    surface_error(&err)
                )));
            }
        }
    }

    /// Re-query the current patient's appointments without touching the
    /// status message a mutation just set.
    fn refresh_appointments(&mut self, conn: &Connection) {
        let Some(patient_id) = self.current_patient().map(|p| p.id) else {
            return;
        };
        if let Ok(appointments) = fetch_appointments_for_patient(conn, patient_id) {
            self.appointments = appointments;
            if self.appointment_cursor >= self.appointments.len() {
                self.appointment_cursor = 0;
            }
        }
    }
}

/// Clamp-style cursor movement shared by every list. Returns whether the
/// cursor actually moved.
fn move_cursor(cursor: &mut usize, len: usize, offset: isize) -> bool {
    if len == 0 {
        return false;
    }
    let max = (len - 1) as isize;
    let moved = (*cursor as isize + offset).clamp(0, max) as usize;
    let changed = moved != *cursor;
    *cursor = moved;
    changed
}
