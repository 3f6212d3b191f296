//! Operations exposed to the HTTP layer.
//!
//! Callers pass the already-authorized [`User`]; role checks happen in the
//! [`RoleGuard`](crate::auth::RoleGuard) before any of these run.

mod accounts;
mod doctors;
mod lab;
mod patients;
mod pharmacy;

pub use accounts::*;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::auth::{PasswordHasher, RoleGuard, TokenService};
use crate::db::Database;
use crate::error::MedRecResult;
use crate::models::{Role, User};
use crate::storage::LabResultStore;

/// Whether the caller has completed their role profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileStatus {
    pub has_profile: bool,
    pub user_id: i64,
    pub email: String,
    pub full_name: String,
}

impl ProfileStatus {
    fn for_user(user: &User, has_profile: bool) -> Self {
        Self {
            has_profile,
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name(),
        }
    }
}

/// Thread-safe handle to the records system. Cheap to clone.
#[derive(Clone)]
pub struct MedicalRecords {
    db: Arc<Mutex<Database>>,
    tokens: TokenService,
    passwords: PasswordHasher,
    lab_results: LabResultStore,
}

impl MedicalRecords {
    pub fn new(
        db: Database,
        tokens: TokenService,
        passwords: PasswordHasher,
        lab_results: LabResultStore,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tokens,
            passwords,
            lab_results,
        }
    }

    fn db(&self) -> MedRecResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn lab_results(&self) -> &LabResultStore {
        &self.lab_results
    }

    /// Resolve a bearer token and require one of `allowed` roles.
    pub fn authorize(&self, token: &str, allowed: &[Role]) -> MedRecResult<User> {
        let db = self.db()?;
        RoleGuard::new(&db, &self.tokens).authorize(token, allowed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use super::*;
    use crate::models::NewUser;

    pub fn records(dir: &std::path::Path) -> MedicalRecords {
        MedicalRecords::new(
            Database::open_in_memory().unwrap(),
            TokenService::new(b"service-test-secret-service-test", Duration::from_secs(900)),
            PasswordHasher::new(4),
            LabResultStore::open(dir).unwrap(),
        )
    }

    pub fn register(records: &MedicalRecords, email: &str, role: Role) -> User {
        records
            .register(NewUser {
                email: email.into(),
                password: "password123".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                role,
                is_active: true,
            })
            .unwrap()
    }
}
