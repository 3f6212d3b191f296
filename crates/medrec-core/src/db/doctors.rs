//! Doctor profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str =
    "id, user_id, specialty, license_number, phone_number, created_at, updated_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        specialty: row.get(2)?,
        license_number: row.get(3)?,
        phone_number: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    /// Insert a new doctor profile, returning its id.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (
                user_id, specialty, license_number, phone_number, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doctor.user_id,
                doctor.specialty,
                doctor.license_number,
                doctor.phone_number,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing doctor profile.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                specialty = ?2,
                license_number = ?3,
                phone_number = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                doctor.id,
                doctor.specialty,
                doctor.license_number,
                doctor.phone_number,
                doctor.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get the profile owned by a user.
    pub fn get_doctor_by_user(&self, user_id: i64) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE user_id = ?"),
                [user_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find the doctor holding a license number.
    pub fn get_doctor_by_license(&self, license_number: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE license_number = ?"),
                [license_number],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}
