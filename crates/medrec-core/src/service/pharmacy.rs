//! Pharmacist operations: prescription lookup and the fill workflow.

use tracing::{info, warn};

use super::MedicalRecords;
use crate::db::FillOutcome;
use crate::error::{MedRecError, MedRecResult};
use crate::models::{FillRequest, Prescription, PrescriptionFill, User};

impl MedicalRecords {
    pub fn list_prescriptions(&self) -> MedRecResult<Vec<Prescription>> {
        Ok(self.db()?.list_prescriptions()?)
    }

    pub fn prescription(&self, id: i64) -> MedRecResult<Prescription> {
        self.db()?
            .get_prescription(id)?
            .ok_or_else(|| MedRecError::NotFound(format!("prescription {id}")))
    }

    /// Record one dispense. Fails with `FillLimitExceeded` once `max_refills + 1`
    /// fills have been recorded; a rejected attempt writes nothing.
    pub fn fill_prescription(
        &self,
        user: &User,
        prescription_id: i64,
        request: FillRequest,
    ) -> MedRecResult<Prescription> {
        request.validate()?;
        let outcome = self
            .db()?
            .record_fill(prescription_id, user.id, &request)?;

        match outcome {
            FillOutcome::Filled { prescription, fill } => {
                info!(
                    prescription_id,
                    fill_id = fill.id,
                    pharmacist_id = user.id,
                    times_filled = prescription.times_filled,
                    remaining = prescription.remaining_fills(),
                    "filled prescription"
                );
                Ok(prescription)
            }
            FillOutcome::Exhausted(prescription) => {
                warn!(
                    prescription_id,
                    pharmacist_id = user.id,
                    times_filled = prescription.times_filled,
                    "fill rejected, limit reached"
                );
                Err(MedRecError::FillLimitExceeded {
                    prescription_id,
                    ceiling: prescription.ceiling(),
                })
            }
        }
    }

    /// Fill history of a prescription, oldest first.
    pub fn prescription_fills(&self, prescription_id: i64) -> MedRecResult<Vec<PrescriptionFill>> {
        let db = self.db()?;
        if db.get_prescription(prescription_id)?.is_none() {
            return Err(MedRecError::NotFound(format!("prescription {prescription_id}")));
        }
        Ok(db.list_fills(prescription_id)?)
    }
}
