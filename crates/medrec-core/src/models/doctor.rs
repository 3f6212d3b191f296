//! Doctor profile models.

use serde::{Deserialize, Serialize};

use super::{now_rfc3339, require_text, ValidationError};

/// A doctor profile, one-to-one with a `DOCTOR` user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialty: String,
    /// Unique across all doctors
    pub license_number: String,
    pub phone_number: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfileInput {
    pub specialty: String,
    pub license_number: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorUpdate {
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub phone_number: Option<String>,
}

/// Doctor profile returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub full_name: String,
}

impl DoctorProfileInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("specialty", &self.specialty)?;
        require_text("license_number", &self.license_number)?;
        require_text("phone_number", &self.phone_number)
    }
}

impl DoctorUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("specialty", &self.specialty),
            ("license_number", &self.license_number),
            ("phone_number", &self.phone_number),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        Ok(())
    }
}

impl Doctor {
    pub fn new(user_id: i64, input: DoctorProfileInput) -> Self {
        let now = now_rfc3339();
        Self {
            id: 0,
            user_id,
            specialty: input.specialty,
            license_number: input.license_number.trim().to_string(),
            phone_number: input.phone_number,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: DoctorUpdate) {
        if let Some(v) = update.specialty {
            self.specialty = v;
        }
        if let Some(v) = update.license_number {
            self.license_number = v.trim().to_string();
        }
        if let Some(v) = update.phone_number {
            self.phone_number = v;
        }
        self.updated_at = now_rfc3339();
    }
}
