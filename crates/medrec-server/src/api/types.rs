//! Shared types for the API layer.

use medrec_core::models::User;
use medrec_core::{MedRecResult, MedicalRecords};

use crate::api::error::ApiError;

/// Shared state for all routes and middleware.
#[derive(Clone)]
pub struct AppState {
    pub records: MedicalRecords,
    /// Request body limit for lab result uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(records: MedicalRecords, max_upload_bytes: usize) -> Self {
        Self {
            records,
            max_upload_bytes,
        }
    }

    /// Run a records operation on the blocking pool.
    ///
    /// Every records call takes the database mutex and may wait on SQLite's
    /// busy timeout, so handlers never call [`MedicalRecords`] inline.
    pub async fn call<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&MedicalRecords) -> MedRecResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let records = self.records.clone();
        run_blocking(move || f(&records)).await
    }
}

/// Authenticated caller, injected into request extensions by the role middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Run a blocking records operation off the async workers.
pub async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> MedRecResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}
