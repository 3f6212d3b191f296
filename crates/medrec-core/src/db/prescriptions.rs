//! Prescription and fill database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{FillRequest, Prescription, PrescriptionFill};

const PRESCRIPTION_COLUMNS: &str = r#"
    id, patient_id, doctor_id, medication_name, dosage, frequency, duration,
    instructions, is_filled, times_filled, max_refills, prescribed_date,
    expiry_date, created_at, updated_at
"#;

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        medication_name: row.get(3)?,
        dosage: row.get(4)?,
        frequency: row.get(5)?,
        duration: row.get(6)?,
        instructions: row.get(7)?,
        is_filled: row.get(8)?,
        times_filled: row.get(9)?,
        max_refills: row.get(10)?,
        prescribed_date: row.get(11)?,
        expiry_date: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn fill_from_row(row: &Row<'_>) -> rusqlite::Result<PrescriptionFill> {
    Ok(PrescriptionFill {
        id: row.get(0)?,
        prescription_id: row.get(1)?,
        pharmacist_id: row.get(2)?,
        quantity_dispensed: row.get(3)?,
        notes: row.get(4)?,
        filled_date: row.get(5)?,
    })
}

fn query_prescription(conn: &Connection, id: i64) -> rusqlite::Result<Option<Prescription>> {
    conn.query_row(
        &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?"),
        [id],
        prescription_from_row,
    )
    .optional()
}

/// Result of a fill attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// The fill was recorded; carries the updated prescription.
    Filled {
        prescription: Prescription,
        fill: PrescriptionFill,
    },
    /// The ceiling had already been reached; nothing was written.
    Exhausted(Prescription),
}

impl Database {
    /// Insert a new prescription, returning its id.
    pub fn insert_prescription(&self, rx: &Prescription) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                patient_id, doctor_id, medication_name, dosage, frequency, duration,
                instructions, is_filled, times_filled, max_refills, prescribed_date,
                expiry_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                rx.patient_id,
                rx.doctor_id,
                rx.medication_name,
                rx.dosage,
                rx.frequency,
                rx.duration,
                rx.instructions,
                rx.is_filled,
                rx.times_filled,
                rx.max_refills,
                rx.prescribed_date,
                rx.expiry_date,
                rx.created_at,
                rx.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a prescription by id.
    pub fn get_prescription(&self, id: i64) -> DbResult<Option<Prescription>> {
        query_prescription(&self.conn, id).map_err(Into::into)
    }

    fn list_prescriptions_where(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions {filter} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params, prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all prescriptions, newest first.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        self.list_prescriptions_where("", [])
    }

    /// List prescriptions issued by a doctor.
    pub fn list_prescriptions_for_doctor(&self, doctor_id: i64) -> DbResult<Vec<Prescription>> {
        self.list_prescriptions_where("WHERE doctor_id = ?", [doctor_id])
    }

    /// List prescriptions written for a patient.
    pub fn list_prescriptions_for_patient(&self, patient_id: i64) -> DbResult<Vec<Prescription>> {
        self.list_prescriptions_where("WHERE patient_id = ?", [patient_id])
    }

    /// Record one fill against a prescription.
    ///
    /// The increment is a conditional update guarded by the ceiling, run in an
    /// immediate transaction with the fill insert, so concurrent writers on any
    /// connection cannot push `times_filled` past `max_refills + 1`.
    pub fn record_fill(
        &mut self,
        prescription_id: i64,
        pharmacist_id: i64,
        request: &FillRequest,
    ) -> DbResult<FillOutcome> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.immediate_transaction()?;

        let updated = tx.execute(
            r#"
            UPDATE prescriptions SET
                times_filled = times_filled + 1,
                is_filled = (times_filled + 1 >= max_refills + 1),
                updated_at = ?2
            WHERE id = ?1 AND times_filled < max_refills + 1
            "#,
            params![prescription_id, now],
        )?;

        if updated == 0 {
            // Nothing written; the transaction rolls back on drop.
            return match query_prescription(&tx, prescription_id)? {
                Some(rx) => Ok(FillOutcome::Exhausted(rx)),
                None => Err(DbError::NotFound(format!(
                    "prescription {prescription_id}"
                ))),
            };
        }

        tx.execute(
            r#"
            INSERT INTO prescription_fills (
                prescription_id, pharmacist_id, quantity_dispensed, notes, filled_date
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                prescription_id,
                pharmacist_id,
                request.quantity_dispensed,
                request.notes,
                now,
            ],
        )?;
        let fill = PrescriptionFill {
            id: tx.last_insert_rowid(),
            prescription_id,
            pharmacist_id,
            quantity_dispensed: request.quantity_dispensed.clone(),
            notes: request.notes.clone(),
            filled_date: now,
        };

        let prescription = query_prescription(&tx, prescription_id)?
            .ok_or_else(|| DbError::NotFound(format!("prescription {prescription_id}")))?;
        tx.commit()?;

        Ok(FillOutcome::Filled { prescription, fill })
    }

    /// List the fill history of a prescription, oldest first.
    pub fn list_fills(&self, prescription_id: i64) -> DbResult<Vec<PrescriptionFill>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, prescription_id, pharmacist_id, quantity_dispensed, notes, filled_date
            FROM prescription_fills
            WHERE prescription_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([prescription_id], fill_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count fill rows for a prescription.
    pub fn count_fills(&self, prescription_id: i64) -> DbResult<u32> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM prescription_fills WHERE prescription_id = ?",
                [prescription_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
