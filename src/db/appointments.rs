use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};

use crate::db::BookingError;
use crate::models::Appointment;

/// Columns selected whenever a hydrated appointment row is needed. The two
/// joined names are display-only and never written back.
const APPOINTMENT_COLUMNS: &str = "a.id, a.doctor_id, a.patient_id, a.scheduled_at, a.notes,
     d.full_name AS doctor_name, p.full_name AS patient_name";

/// Get every appointment booked for one patient, soonest first, with the
/// doctor and patient names joined in for display.
pub fn fetch_appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS}
             FROM appointments a
             INNER JOIN doctors d ON d.id = a.doctor_id
             INNER JOIN patients p ON p.id = a.patient_id
             WHERE a.patient_id = ?1
             ORDER BY a.scheduled_at",
        ))
        .context("failed to prepare appointment query")?;

    let appointments = stmt
        .query_map([patient_id], appointment_from_row)
        .context("failed to load appointments")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect appointments")?;

    Ok(appointments)
}

/// Book one slot. The availability check, the conflict check, and the insert
/// run inside a single transaction, and the `(doctor_id, scheduled_at)`
/// unique constraint backs the conflict check at the store level, so two
/// racing bookings cannot both land a row.
///
/// Failure kinds are explicit so the booking screen can branch without
/// inspecting message text.
pub fn book_appointment(
    conn: &Connection,
    doctor_id: i64,
    patient_id: i64,
    scheduled_at: NaiveDateTime,
    notes: Option<&str>,
) -> Result<Appointment, BookingError> {
    let tx = conn.unchecked_transaction()?;

    let available: Option<bool> = tx
        .query_row(
            "SELECT available FROM doctors WHERE id = ?1",
            [doctor_id],
            |row| row.get(0),
        )
        .optional()?;
    match available {
        None => return Err(BookingError::DoctorNotFound(doctor_id)),
        Some(false) => return Err(BookingError::DoctorUnavailable(doctor_id)),
        Some(true) => {}
    }

    if slot_occupied(&tx, doctor_id, scheduled_at, None)? {
        return Err(BookingError::SlotTaken);
    }

    tx.execute(
        "INSERT INTO appointments (doctor_id, patient_id, scheduled_at, notes)
         VALUES (?1, ?2, ?3, ?4)",
        params![doctor_id, patient_id, scheduled_at, notes],
    )
    .map_err(map_slot_constraint)?;

    let appointment = tx.query_row(
        &format!(
            "SELECT {APPOINTMENT_COLUMNS}
             FROM appointments a
             INNER JOIN doctors d ON d.id = a.doctor_id
             INNER JOIN patients p ON p.id = a.patient_id
             WHERE a.id = ?1",
        ),
        [tx.last_insert_rowid()],
        appointment_from_row,
    )?;

    tx.commit()?;
    Ok(appointment)
}

/// Move an existing appointment to a new date. Returns `Ok(false)` when no
/// appointment has the given id. The new slot is conflict-checked against the
/// appointment's doctor inside the same transaction, so a reschedule obeys
/// the same double-booking rule as a fresh booking.
pub fn reschedule_appointment(
    conn: &Connection,
    appointment_id: i64,
    new_date: NaiveDateTime,
) -> Result<bool, BookingError> {
    let tx = conn.unchecked_transaction()?;

    let doctor_id: Option<i64> = tx
        .query_row(
            "SELECT doctor_id FROM appointments WHERE id = ?1",
            [appointment_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(doctor_id) = doctor_id else {
        return Ok(false);
    };

    if slot_occupied(&tx, doctor_id, new_date, Some(appointment_id))? {
        return Err(BookingError::SlotTaken);
    }

    let updated = tx
        .execute(
            "UPDATE appointments SET scheduled_at = ?1 WHERE id = ?2",
            params![new_date, appointment_id],
        )
        .map_err(map_slot_constraint)?;

    tx.commit()?;
    Ok(updated == 1)
}

/// Remove an appointment row. Zero rows deleted is a boolean failure rather
/// than an error, matching the management screen's "nothing happened"
/// messaging.
pub fn delete_appointment(conn: &Connection, appointment_id: i64) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM appointments WHERE id = ?1",
            params![appointment_id],
        )
        .context("failed to delete appointment")?;

    Ok(deleted == 1)
}

/// Pre-insert existence check for the slot-conflict rule. `exclude` lets the
/// reschedule path ignore the row it is about to move.
fn slot_occupied(
    conn: &Connection,
    doctor_id: i64,
    scheduled_at: NaiveDateTime,
    exclude: Option<i64>,
) -> Result<bool, SqlError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND scheduled_at = ?2 AND (?3 IS NULL OR id <> ?3)",
        params![doctor_id, scheduled_at, exclude],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Coerce a unique-constraint violation on `(doctor_id, scheduled_at)` into
/// the slot-conflict kind. This only fires when a concurrent writer slipped
/// between the existence check and the insert.
fn map_slot_constraint(err: SqlError) -> BookingError {
    if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        BookingError::SlotTaken
    } else {
        BookingError::Database(err)
    }
}

fn appointment_from_row(row: &Row<'_>) -> Result<Appointment, SqlError> {
    Ok(Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        scheduled_at: row.get(3)?,
        notes: row.get(4)?,
        doctor_name: row.get(5)?,
        patient_name: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{ensure_schema, DbConfig};
    use chrono::NaiveDate;

    fn test_db() -> Connection {
        let conn = ensure_schema(&DbConfig::in_memory()).expect("in-memory DB");
        conn.execute_batch(
            "INSERT INTO doctors (id, full_name, specialty, available) VALUES
                (1, 'Dr. Alice Hart', 'Cardiology', 1),
                (2, 'Dr. Brian Osei', 'Dermatology', 0);
             INSERT INTO patients (id, full_name, email) VALUES
                (7, 'Grace Miller', 'grace@example.com'),
                (9, 'Hassan Ali', 'hassan@example.com');",
        )
        .expect("seed reference rows");
        conn
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn appointment_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .expect("count appointments")
    }

    #[test]
    fn booking_a_free_slot_inserts_one_hydrated_row() {
        let conn = test_db();
        let appointment =
            book_appointment(&conn, 1, 7, at(1, 9), Some("first visit")).expect("book");

        assert_eq!(appointment.doctor_id, 1);
        assert_eq!(appointment.patient_id, 7);
        assert_eq!(appointment.doctor_name, "Dr. Alice Hart");
        assert_eq!(appointment.patient_name, "Grace Miller");
        assert_eq!(appointment.notes.as_deref(), Some("first visit"));
        assert_eq!(appointment_count(&conn), 1);
    }

    #[test]
    fn booking_an_unknown_doctor_fails_without_insert() {
        let conn = test_db();
        let err = book_appointment(&conn, 99, 7, at(1, 9), None).unwrap_err();
        assert!(matches!(err, BookingError::DoctorNotFound(99)));
        assert_eq!(appointment_count(&conn), 0);
    }

    #[test]
    fn booking_an_unavailable_doctor_fails_without_insert() {
        let conn = test_db();
        let err = book_appointment(&conn, 2, 7, at(1, 9), None).unwrap_err();
        assert!(matches!(err, BookingError::DoctorUnavailable(2)));
        assert_eq!(appointment_count(&conn), 0);
    }

    #[test]
    fn booking_an_occupied_slot_fails_without_insert() {
        let conn = test_db();
        book_appointment(&conn, 1, 7, at(1, 9), None).expect("first booking");

        let err = book_appointment(&conn, 1, 9, at(1, 9), None).unwrap_err();
        assert!(matches!(err, BookingError::SlotTaken));
        assert_eq!(appointment_count(&conn), 1);
    }

    #[test]
    fn same_time_with_another_doctor_is_not_a_conflict() {
        let conn = test_db();
        conn.execute("UPDATE doctors SET available = 1 WHERE id = 2", [])
            .expect("free up second doctor");

        book_appointment(&conn, 1, 7, at(1, 9), None).expect("first booking");
        book_appointment(&conn, 2, 7, at(1, 9), None).expect("second doctor, same time");
        assert_eq!(appointment_count(&conn), 2);
    }

    #[test]
    fn unique_constraint_backs_the_conflict_check() {
        let conn = test_db();
        book_appointment(&conn, 1, 7, at(1, 9), None).expect("first booking");

        // Bypass the pre-insert check to simulate a racing writer.
        let err = conn
            .execute(
                "INSERT INTO appointments (doctor_id, patient_id, scheduled_at, notes)
                 VALUES (1, 9, ?1, NULL)",
                params![at(1, 9)],
            )
            .unwrap_err();
        assert!(matches!(map_slot_constraint(err), BookingError::SlotTaken));
    }

    #[test]
    fn patient_appointments_come_back_sorted_by_date() {
        let conn = test_db();
        book_appointment(&conn, 1, 7, at(2, 14), None).expect("later booking");
        book_appointment(&conn, 1, 7, at(1, 9), None).expect("earlier booking");
        book_appointment(&conn, 1, 9, at(3, 9), None).expect("other patient");

        let appointments = fetch_appointments_for_patient(&conn, 7).expect("fetch");
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].scheduled_at, at(1, 9));
        assert_eq!(appointments[1].scheduled_at, at(2, 14));
    }

    #[test]
    fn rescheduling_moves_the_row() {
        let conn = test_db();
        let appointment = book_appointment(&conn, 1, 7, at(1, 9), None).expect("book");

        let moved = reschedule_appointment(&conn, appointment.id, at(2, 10)).expect("reschedule");
        assert!(moved);

        let appointments = fetch_appointments_for_patient(&conn, 7).expect("fetch");
        assert_eq!(appointments[0].scheduled_at, at(2, 10));
    }

    #[test]
    fn rescheduling_a_missing_id_returns_false() {
        let conn = test_db();
        let moved = reschedule_appointment(&conn, 42, at(1, 9)).expect("reschedule");
        assert!(!moved);
    }

    #[test]
    fn rescheduling_into_an_occupied_slot_is_rejected() {
        let conn = test_db();
        book_appointment(&conn, 1, 7, at(1, 9), None).expect("occupies target slot");
        let second = book_appointment(&conn, 1, 9, at(2, 10), None).expect("second booking");

        let err = reschedule_appointment(&conn, second.id, at(1, 9)).unwrap_err();
        assert!(matches!(err, BookingError::SlotTaken));

        // Unmoved.
        let appointments = fetch_appointments_for_patient(&conn, 9).expect("fetch");
        assert_eq!(appointments[0].scheduled_at, at(2, 10));
    }

    #[test]
    fn rescheduling_onto_its_own_slot_is_allowed() {
        let conn = test_db();
        let appointment = book_appointment(&conn, 1, 7, at(1, 9), None).expect("book");
        let moved = reschedule_appointment(&conn, appointment.id, at(1, 9)).expect("reschedule");
        assert!(moved);
    }

    #[test]
    fn deleted_appointments_disappear_from_patient_queries() {
        let conn = test_db();
        let appointment = book_appointment(&conn, 1, 7, at(1, 9), None).expect("book");

        assert!(delete_appointment(&conn, appointment.id).expect("delete"));
        assert!(fetch_appointments_for_patient(&conn, 7)
            .expect("fetch")
            .is_empty());
    }

    #[test]
    fn deleting_a_missing_id_returns_false() {
        let conn = test_db();
        assert!(!delete_appointment(&conn, 42).expect("delete"));
    }

    #[test]
    fn freed_slot_can_be_rebooked() {
        let conn = test_db();
        let appointment = book_appointment(&conn, 1, 7, at(1, 9), None).expect("book");
        delete_appointment(&conn, appointment.id).expect("delete");

        book_appointment(&conn, 1, 9, at(1, 9), None).expect("rebook freed slot");
    }
}
