use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::Patient;

/// Retrieve every patient sorted by name. The query doubles as the single
/// source of truth for how the booking and management screens order their
/// patient pickers.
pub fn fetch_patients(conn: &Connection) -> Result<Vec<Patient>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, full_name, email
             FROM patients
             ORDER BY full_name COLLATE NOCASE",
        )
        .context("failed to prepare patient query")?;

    let patients = stmt
        .query_map([], |row| {
            Ok(Patient {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
            })
        })
        .context("failed to load patients")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect patients")?;

    Ok(patients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{ensure_schema, DbConfig};

    #[test]
    fn patients_are_sorted_ascending_by_name() {
        let conn = ensure_schema(&DbConfig::in_memory()).expect("in-memory DB");
        conn.execute_batch(
            "INSERT INTO patients (full_name, email) VALUES
                ('Zoe Park', 'zoe@example.com'),
                ('amir Khan', 'amir@example.com'),
                ('Grace Miller', 'grace@example.com');",
        )
        .expect("seed patients");

        let patients = fetch_patients(&conn).expect("fetch");
        let names: Vec<&str> = patients.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["amir Khan", "Grace Miller", "Zoe Park"]);
    }

    #[test]
    fn empty_table_yields_empty_list() {
        let conn = ensure_schema(&DbConfig::in_memory()).expect("in-memory DB");
        assert!(fetch_patients(&conn).expect("fetch").is_empty());
    }
}
