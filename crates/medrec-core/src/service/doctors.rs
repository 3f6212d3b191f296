//! Doctor operations: profile, patient lookup and prescribing.

use tracing::info;

use super::{MedicalRecords, ProfileStatus};
use crate::db::Database;
use crate::error::{MedRecError, MedRecResult};
use crate::models::{
    Doctor, DoctorProfile, DoctorProfileInput, DoctorUpdate, NewPrescription, PatientRecord,
    Prescription, User,
};

fn license_taken() -> MedRecError {
    MedRecError::Conflict("License number already registered".into())
}

fn doctor_for(db: &Database, user: &User) -> MedRecResult<Doctor> {
    db.get_doctor_by_user(user.id)?
        .ok_or_else(|| MedRecError::NotFound("Doctor profile not found".into()))
}

impl MedicalRecords {
    pub fn doctor_profile_status(&self, user: &User) -> MedRecResult<ProfileStatus> {
        let exists = self.db()?.get_doctor_by_user(user.id)?.is_some();
        Ok(ProfileStatus::for_user(user, exists))
    }

    /// Create the caller's doctor profile. License numbers are unique.
    pub fn create_doctor_profile(
        &self,
        user: &User,
        input: DoctorProfileInput,
    ) -> MedRecResult<DoctorProfile> {
        input.validate()?;
        let db = self.db()?;
        if db.get_doctor_by_user(user.id)?.is_some() {
            return Err(MedRecError::Conflict("Doctor profile already exists".into()));
        }
        let mut doctor = Doctor::new(user.id, input);
        if db.get_doctor_by_license(&doctor.license_number)?.is_some() {
            return Err(license_taken());
        }

        doctor.id = db.insert_doctor(&doctor).map_err(|e| match MedRecError::from(e) {
            MedRecError::Conflict(_) => license_taken(),
            other => other,
        })?;
        info!(user_id = user.id, doctor_id = doctor.id, "created doctor profile");
        Ok(DoctorProfile {
            doctor,
            full_name: user.full_name(),
        })
    }

    pub fn doctor_profile(&self, user: &User) -> MedRecResult<DoctorProfile> {
        let doctor = doctor_for(&*self.db()?, user)?;
        Ok(DoctorProfile {
            doctor,
            full_name: user.full_name(),
        })
    }

    pub fn update_doctor_profile(
        &self,
        user: &User,
        update: DoctorUpdate,
    ) -> MedRecResult<DoctorProfile> {
        update.validate()?;
        let db = self.db()?;
        let mut doctor = doctor_for(&db, user)?;
        doctor.apply(update);

        if let Some(holder) = db.get_doctor_by_license(&doctor.license_number)? {
            if holder.id != doctor.id {
                return Err(license_taken());
            }
        }
        db.update_doctor(&doctor).map_err(|e| match MedRecError::from(e) {
            MedRecError::Conflict(_) => license_taken(),
            other => other,
        })?;
        info!(doctor_id = doctor.id, "updated doctor profile");
        Ok(DoctorProfile {
            doctor,
            full_name: user.full_name(),
        })
    }

    pub fn list_patients(&self) -> MedRecResult<Vec<PatientRecord>> {
        Ok(self.db()?.list_patient_records()?)
    }

    pub fn patient_record(&self, patient_id: i64) -> MedRecResult<PatientRecord> {
        self.db()?
            .get_patient_record(patient_id)?
            .ok_or_else(|| MedRecError::NotFound(format!("patient {patient_id}")))
    }

    /// Issue a prescription from the caller's doctor profile.
    pub fn create_prescription(
        &self,
        user: &User,
        order: NewPrescription,
    ) -> MedRecResult<Prescription> {
        order.validate()?;
        let db = self.db()?;
        let doctor = doctor_for(&db, user)?;
        if db.get_patient(order.patient_id)?.is_none() {
            return Err(MedRecError::NotFound(format!("patient {}", order.patient_id)));
        }

        let mut rx = Prescription::new(doctor.id, order);
        rx.id = db.insert_prescription(&rx)?;
        info!(
            prescription_id = rx.id,
            doctor_id = doctor.id,
            patient_id = rx.patient_id,
            max_refills = rx.max_refills,
            "issued prescription"
        );
        Ok(rx)
    }

    /// Prescriptions issued by the caller, newest first.
    pub fn doctor_prescriptions(&self, user: &User) -> MedRecResult<Vec<Prescription>> {
        let db = self.db()?;
        let doctor = doctor_for(&db, user)?;
        Ok(db.list_prescriptions_for_doctor(doctor.id)?)
    }

    /// One of the caller's own prescriptions. Other doctors' prescriptions read as missing.
    pub fn doctor_prescription(&self, user: &User, id: i64) -> MedRecResult<Prescription> {
        let db = self.db()?;
        let doctor = doctor_for(&db, user)?;
        db.get_prescription(id)?
            .filter(|rx| rx.doctor_id == doctor.id)
            .ok_or_else(|| MedRecError::NotFound(format!("prescription {id}")))
    }
}
