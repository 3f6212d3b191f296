//! Patient-facing operations. The caller is always the patient themself.

use tracing::info;

use super::{MedicalRecords, ProfileStatus};
use crate::error::{MedRecError, MedRecResult};
use crate::models::{
    LabTest, Patient, PatientProfileInput, PatientUpdate, Prescription, User,
};

fn no_profile() -> MedRecError {
    MedRecError::NotFound("Patient profile not found".into())
}

impl MedicalRecords {
    pub fn patient_profile_status(&self, user: &User) -> MedRecResult<ProfileStatus> {
        let exists = self.db()?.get_patient_by_user(user.id)?.is_some();
        Ok(ProfileStatus::for_user(user, exists))
    }

    /// Create the caller's profile. At most one per user.
    pub fn create_patient_profile(
        &self,
        user: &User,
        input: PatientProfileInput,
    ) -> MedRecResult<Patient> {
        input.validate()?;
        let db = self.db()?;
        if db.get_patient_by_user(user.id)?.is_some() {
            return Err(MedRecError::Conflict("Patient profile already exists".into()));
        }

        let mut patient = Patient::new(user.id, input);
        patient.id = db.insert_patient(&patient).map_err(|e| match MedRecError::from(e) {
            MedRecError::Conflict(_) => {
                MedRecError::Conflict("Patient profile already exists".into())
            }
            other => other,
        })?;
        info!(user_id = user.id, patient_id = patient.id, "created patient profile");
        Ok(patient)
    }

    pub fn patient_profile(&self, user: &User) -> MedRecResult<Patient> {
        self.db()?.get_patient_by_user(user.id)?.ok_or_else(no_profile)
    }

    pub fn update_patient_profile(
        &self,
        user: &User,
        update: PatientUpdate,
    ) -> MedRecResult<Patient> {
        update.validate()?;
        let db = self.db()?;
        let mut patient = db.get_patient_by_user(user.id)?.ok_or_else(no_profile)?;
        patient.apply(update);
        db.update_patient(&patient)?;
        info!(patient_id = patient.id, "updated patient profile");
        Ok(patient)
    }

    /// Prescriptions issued to the caller.
    pub fn patient_prescriptions(&self, user: &User) -> MedRecResult<Vec<Prescription>> {
        let db = self.db()?;
        let patient = db.get_patient_by_user(user.id)?.ok_or_else(no_profile)?;
        Ok(db.list_prescriptions_for_patient(patient.id)?)
    }

    /// Lab tests recorded for the caller.
    pub fn patient_lab_tests(&self, user: &User) -> MedRecResult<Vec<LabTest>> {
        let db = self.db()?;
        let patient = db.get_patient_by_user(user.id)?.ok_or_else(no_profile)?;
        Ok(db.list_lab_tests_for_patient(patient.id)?)
    }
}
