use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::Doctor;

/// Retrieve doctors ordered by name, optionally narrowed by case-insensitive
/// substring filters on the name and specialty columns. A `None` or blank
/// filter matches every row, which lets the doctor screen pass its input
/// fields through unchanged.
pub fn fetch_doctors(
    conn: &Connection,
    name_filter: Option<&str>,
    specialty_filter: Option<&str>,
) -> Result<Vec<Doctor>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, full_name, specialty, available
             FROM doctors
             WHERE (?1 IS NULL OR full_name LIKE '%' || ?1 || '%')
               AND (?2 IS NULL OR specialty LIKE '%' || ?2 || '%')
             ORDER BY full_name COLLATE NOCASE",
        )
        .context("failed to prepare doctor query")?;

    let doctors = stmt
        .query_map(
            params![normalize(name_filter), normalize(specialty_filter)],
            |row| {
                Ok(Doctor {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    specialty: row.get(2)?,
                    available: row.get(3)?,
                })
            },
        )
        .context("failed to load doctors")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect doctors")?;

    Ok(doctors)
}

/// Treat blank filter strings the same as an absent filter so the SQL only
/// has to reason about NULL.
fn normalize(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{ensure_schema, DbConfig};

    fn test_db() -> Connection {
        let conn = ensure_schema(&DbConfig::in_memory()).expect("in-memory DB");
        conn.execute_batch(
            "INSERT INTO doctors (full_name, specialty, available) VALUES
                ('Dr. Alice Hart', 'Cardiology', 1),
                ('Dr. Brian Osei', 'Dermatology', 1),
                ('Dr. Carmen Silva', 'Pediatrics', 0);",
        )
        .expect("seed doctors");
        conn
    }

    #[test]
    fn no_filters_return_all_sorted_by_name() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, None, None).expect("fetch");
        let names: Vec<&str> = doctors.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Dr. Alice Hart", "Dr. Brian Osei", "Dr. Carmen Silva"]
        );
    }

    #[test]
    fn name_filter_matches_substring_case_insensitively() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, Some("alice"), None).expect("fetch");
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].full_name, "Dr. Alice Hart");
    }

    #[test]
    fn specialty_filter_narrows_results() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, None, Some("derm")).expect("fetch");
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].full_name, "Dr. Brian Osei");
    }

    #[test]
    fn both_filters_must_match() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, Some("Hart"), Some("Dermatology")).expect("fetch");
        assert!(doctors.is_empty());
    }

    #[test]
    fn blank_filter_behaves_like_none() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, Some("   "), Some("")).expect("fetch");
        assert_eq!(doctors.len(), 3);
    }

    #[test]
    fn availability_flag_round_trips() {
        let conn = test_db();
        let doctors = fetch_doctors(&conn, Some("Carmen"), None).expect("fetch");
        assert!(!doctors[0].available);
    }
}
