//! Patient profile models.

use serde::{Deserialize, Serialize};

use super::{now_rfc3339, parse_date, require_text, ValidationError};

/// A patient profile, one-to-one with a `PATIENT` user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// ISO date (YYYY-MM-DD)
    pub date_of_birth: String,
    pub phone_number: String,
    pub address: String,
    pub blood_type: String,
    pub allergies: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub medical_history: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Patient profile creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfileInput {
    pub date_of_birth: String,
    pub phone_number: String,
    pub address: String,
    pub blood_type: String,
    #[serde(default)]
    pub allergies: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub medical_history: String,
}

/// Partial patient profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientUpdate {
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
    pub medical_history: Option<String>,
}

/// A patient as seen by clinicians, with the owning user's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub patient: Patient,
    pub patient_name: String,
}

fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    let date = parse_date("date_of_birth", value)?;
    if date > chrono::Utc::now().date_naive() {
        return Err(ValidationError("date_of_birth is in the future".into()));
    }
    Ok(())
}

impl PatientProfileInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_birth_date(&self.date_of_birth)?;
        require_text("phone_number", &self.phone_number)?;
        require_text("address", &self.address)?;
        require_text("blood_type", &self.blood_type)?;
        require_text("emergency_contact_name", &self.emergency_contact_name)?;
        require_text("emergency_contact_number", &self.emergency_contact_number)?;
        Ok(())
    }
}

impl PatientUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(dob) = &self.date_of_birth {
            validate_birth_date(dob)?;
        }
        let required = [
            ("phone_number", &self.phone_number),
            ("address", &self.address),
            ("blood_type", &self.blood_type),
            ("emergency_contact_name", &self.emergency_contact_name),
            ("emergency_contact_number", &self.emergency_contact_number),
        ];
        for (field, value) in required {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        Ok(())
    }
}

impl Patient {
    /// Build a not-yet-persisted profile for `user_id`.
    pub fn new(user_id: i64, input: PatientProfileInput) -> Self {
        let now = now_rfc3339();
        Self {
            id: 0,
            user_id,
            date_of_birth: input.date_of_birth.trim().to_string(),
            phone_number: input.phone_number,
            address: input.address,
            blood_type: input.blood_type,
            allergies: input.allergies,
            emergency_contact_name: input.emergency_contact_name,
            emergency_contact_number: input.emergency_contact_number,
            medical_history: input.medical_history,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply the fields present in `update`.
    pub fn apply(&mut self, update: PatientUpdate) {
        if let Some(v) = update.date_of_birth {
            self.date_of_birth = v.trim().to_string();
        }
        if let Some(v) = update.phone_number {
            self.phone_number = v;
        }
        if let Some(v) = update.address {
            self.address = v;
        }
        if let Some(v) = update.blood_type {
            self.blood_type = v;
        }
        if let Some(v) = update.allergies {
            self.allergies = Some(v);
        }
        if let Some(v) = update.emergency_contact_name {
            self.emergency_contact_name = v;
        }
        if let Some(v) = update.emergency_contact_number {
            self.emergency_contact_number = v;
        }
        if let Some(v) = update.medical_history {
            self.medical_history = v;
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> PatientProfileInput {
    PatientProfileInput {
        date_of_birth: "1985-04-12".into(),
        phone_number: "555-0100".into(),
        address: "1 Main St".into(),
        blood_type: "O+".into(),
        allergies: Some("penicillin".into()),
        emergency_contact_name: "Grace Hopper".into(),
        emergency_contact_number: "555-0199".into(),
        medical_history: "asthma".into(),
    }
}
