//! Patient profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Patient, PatientRecord};

const PATIENT_COLUMNS: &str = r#"
    p.id, p.user_id, p.date_of_birth, p.phone_number, p.address, p.blood_type,
    p.allergies, p.emergency_contact_name, p.emergency_contact_number,
    p.medical_history, p.created_at, p.updated_at
"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date_of_birth: row.get(2)?,
        phone_number: row.get(3)?,
        address: row.get(4)?,
        blood_type: row.get(5)?,
        allergies: row.get(6)?,
        emergency_contact_name: row.get(7)?,
        emergency_contact_number: row.get(8)?,
        medical_history: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    let first: String = row.get(12)?;
    let last: String = row.get(13)?;
    Ok(PatientRecord {
        patient: patient_from_row(row)?,
        patient_name: format!("{first} {last}"),
    })
}

impl Database {
    /// Insert a new patient profile, returning its id.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                user_id, date_of_birth, phone_number, address, blood_type, allergies,
                emergency_contact_name, emergency_contact_number, medical_history,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient.user_id,
                patient.date_of_birth,
                patient.phone_number,
                patient.address,
                patient.blood_type,
                patient.allergies,
                patient.emergency_contact_name,
                patient.emergency_contact_number,
                patient.medical_history,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing patient profile.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                date_of_birth = ?2,
                phone_number = ?3,
                address = ?4,
                blood_type = ?5,
                allergies = ?6,
                emergency_contact_name = ?7,
                emergency_contact_number = ?8,
                medical_history = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.date_of_birth,
                patient.phone_number,
                patient.address,
                patient.blood_type,
                patient.allergies,
                patient.emergency_contact_name,
                patient.emergency_contact_number,
                patient.medical_history,
                patient.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient profile by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients p WHERE p.id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the profile owned by a user.
    pub fn get_patient_by_user(&self, user_id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients p WHERE p.user_id = ?"),
                [user_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient with the owning user's name.
    pub fn get_patient_record(&self, id: i64) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {PATIENT_COLUMNS}, u.first_name, u.last_name
                    FROM patients p JOIN users u ON u.id = p.user_id
                    WHERE p.id = ?
                    "#
                ),
                [id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List every patient with the owning user's name.
    pub fn list_patient_records(&self) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {PATIENT_COLUMNS}, u.first_name, u.last_name
            FROM patients p JOIN users u ON u.id = p.user_id
            ORDER BY u.last_name, u.first_name, p.id
            "#
        ))?;
        let rows = stmt.query_map([], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
