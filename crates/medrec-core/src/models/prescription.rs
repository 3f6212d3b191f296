//! Prescription and fill models.
//!
//! A prescription allows `max_refills + 1` fills in total: the initial
//! dispense plus `max_refills` refills. Once that ceiling is reached the
//! prescription is exhausted and `is_filled` is set.

use serde::{Deserialize, Serialize};

use super::{now_rfc3339, parse_date, require_text, ValidationError};

/// Where a prescription sits in its fill lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillState {
    /// Fills remain
    Active,
    /// Ceiling reached (terminal)
    Exhausted,
}

/// A doctor-authored medication order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    /// Issuing doctor profile
    pub doctor_id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
    pub is_filled: bool,
    pub times_filled: u32,
    pub max_refills: u32,
    pub prescribed_date: String,
    /// ISO date (YYYY-MM-DD)
    pub expiry_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Prescription creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub max_refills: u32,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// One dispense event against a prescription. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionFill {
    pub id: i64,
    pub prescription_id: i64,
    /// User id of the dispensing pharmacist
    pub pharmacist_id: i64,
    pub quantity_dispensed: String,
    pub notes: Option<String>,
    pub filled_date: String,
}

/// Fill request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillRequest {
    pub quantity_dispensed: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPrescription {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("medication_name", &self.medication_name)?;
        require_text("dosage", &self.dosage)?;
        require_text("frequency", &self.frequency)?;
        require_text("duration", &self.duration)?;
        if let Some(expiry) = &self.expiry_date {
            parse_date("expiry_date", expiry)?;
        }
        Ok(())
    }
}

impl FillRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("quantity_dispensed", &self.quantity_dispensed)
    }
}

impl Prescription {
    /// Build a not-yet-persisted prescription issued by `doctor_id`.
    pub fn new(doctor_id: i64, order: NewPrescription) -> Self {
        let now = now_rfc3339();
        Self {
            id: 0,
            patient_id: order.patient_id,
            doctor_id,
            medication_name: order.medication_name,
            dosage: order.dosage,
            frequency: order.frequency,
            duration: order.duration,
            instructions: order.instructions,
            is_filled: false,
            times_filled: 0,
            max_refills: order.max_refills,
            prescribed_date: now.clone(),
            expiry_date: order.expiry_date.map(|d| d.trim().to_string()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Total fills allowed.
    pub fn ceiling(&self) -> u32 {
        self.max_refills.saturating_add(1)
    }

    pub fn fill_state(&self) -> FillState {
        if self.times_filled >= self.ceiling() {
            FillState::Exhausted
        } else {
            FillState::Active
        }
    }

    pub fn remaining_fills(&self) -> u32 {
        self.ceiling().saturating_sub(self.times_filled)
    }
}

#[cfg(test)]
pub(crate) fn sample_order(patient_id: i64, max_refills: u32) -> NewPrescription {
    NewPrescription {
        patient_id,
        medication_name: "Amoxicillin".into(),
        dosage: "500mg".into(),
        frequency: "3x daily".into(),
        duration: "10 days".into(),
        instructions: Some("Take with food".into()),
        max_refills,
        expiry_date: Some("2030-12-31".into()),
    }
}
