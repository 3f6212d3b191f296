//! MedRec Core Library
//!
//! Role-based medical records: patients, doctors, pharmacists and bio-analysts
//! each see and change a controlled slice of the record.
//!
//! # Architecture
//!
//! ```text
//!   bearer token ──► RoleGuard ──► role allow-list
//!                        │
//!                        ▼
//!                 MedicalRecords (Arc<Mutex<Database>>)
//!                        │
//!        ┌───────────────┼────────────────┬──────────────────┐
//!        ▼               ▼                ▼                  ▼
//!    Profiles      Prescriptions     Fill workflow      Lab results
//!   (patient,      (doctor issues)   (conditional       (blob first,
//!    doctor)                          UPDATE, ceiling    row second)
//!                                     max_refills + 1)
//! ```
//!
//! # Core Principle
//!
//! **A prescription is never filled more than `max_refills + 1` times.** The
//! ceiling is enforced by the fill UPDATE itself and again by a schema CHECK.
//!
//! # Modules
//!
//! - [`db`]: SQLite layer, one `impl Database` per table
//! - [`models`]: Domain types (User, Patient, Doctor, Prescription, LabTest)
//! - [`auth`]: bcrypt password hashing, HS256 tokens, role guard
//! - [`storage`]: On-disk lab result store
//! - [`service`]: The [`MedicalRecords`] facade used by the HTTP layer

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use auth::{AccessToken, Claims, PasswordHasher, RoleGuard, TokenService};
pub use db::{Database, DbError, FillOutcome};
pub use error::{MedRecError, MedRecResult};
pub use models::{
    Doctor, DoctorProfile, FillRequest, LabTest, NewPrescription, NewUser, Patient,
    PatientRecord, Prescription, PrescriptionFill, Role, User,
};
pub use service::{MedicalRecords, ProfileStatus, TokenIdentity};
pub use storage::LabResultStore;
