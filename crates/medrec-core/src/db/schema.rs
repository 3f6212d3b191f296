//! SQLite schema definition.

/// Complete database schema.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users (credential store)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL
        CHECK (role IN ('PATIENT', 'DOCTOR', 'PHARMACIST', 'BIO_ANALYST', 'ADMIN')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TRIGGER IF NOT EXISTS users_role_immutable BEFORE UPDATE OF role ON users
WHEN new.role <> old.role
BEGIN
    SELECT RAISE(ABORT, 'User role is immutable');
END;

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

-- ============================================================================
-- Profiles (one-to-one with users)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
    date_of_birth TEXT NOT NULL,                 -- YYYY-MM-DD
    phone_number TEXT NOT NULL,
    address TEXT NOT NULL,
    blood_type TEXT NOT NULL,
    allergies TEXT,
    emergency_contact_name TEXT NOT NULL,
    emergency_contact_number TEXT NOT NULL,
    medical_history TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
    specialty TEXT NOT NULL,
    license_number TEXT NOT NULL UNIQUE,
    phone_number TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES doctors(id),
    medication_name TEXT NOT NULL,
    dosage TEXT NOT NULL,
    frequency TEXT NOT NULL,
    duration TEXT NOT NULL,
    instructions TEXT,
    is_filled INTEGER NOT NULL DEFAULT 0,
    times_filled INTEGER NOT NULL DEFAULT 0,
    max_refills INTEGER NOT NULL DEFAULT 0 CHECK (max_refills >= 0),
    prescribed_date TEXT NOT NULL,
    expiry_date TEXT,                            -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    -- fill ceiling: initial dispense plus max_refills refills
    CHECK (times_filled >= 0 AND times_filled <= max_refills + 1)
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_doctor ON prescriptions(doctor_id);

-- Fill events (append-only)
CREATE TABLE IF NOT EXISTS prescription_fills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prescription_id INTEGER NOT NULL REFERENCES prescriptions(id),
    pharmacist_id INTEGER NOT NULL REFERENCES users(id),
    quantity_dispensed TEXT NOT NULL,
    notes TEXT,
    filled_date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_fills_prescription ON prescription_fills(prescription_id);

CREATE TRIGGER IF NOT EXISTS prescription_fills_no_update BEFORE UPDATE ON prescription_fills
BEGIN
    SELECT RAISE(ABORT, 'Prescription fills are append-only');
END;

CREATE TRIGGER IF NOT EXISTS prescription_fills_no_delete BEFORE DELETE ON prescription_fills
BEGIN
    SELECT RAISE(ABORT, 'Prescription fills are append-only');
END;

-- ============================================================================
-- Lab Tests (result files live in the lab-result store)
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_tests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    bio_analyst_id INTEGER NOT NULL REFERENCES users(id),
    test_name TEXT NOT NULL,
    test_date TEXT NOT NULL,
    file_ref TEXT NOT NULL UNIQUE,
    original_filename TEXT NOT NULL,
    content_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
    sha256 TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_tests_patient ON lab_tests(patient_id);
"#;
