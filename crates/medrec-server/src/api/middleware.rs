//! Bearer token authentication and role gating.
//!
//! Each role router is wrapped in [`require_role`] with its own allow-list.
//! On success the resolved [`CurrentUser`] is inserted into request extensions.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use medrec_core::models::Role;
use medrec_core::MedicalRecords;

use crate::api::error::ApiError;
use crate::api::types::{run_blocking, AppState, CurrentUser};

/// Middleware state: the records handle plus the roles allowed through.
#[derive(Clone)]
pub struct RoleGate {
    records: MedicalRecords,
    roles: &'static [Role],
}

impl RoleGate {
    pub fn new(state: &AppState, roles: &'static [Role]) -> Self {
        Self {
            records: state.records.clone(),
            roles,
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Not authenticated".into()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthenticated("Malformed authorization header".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(ApiError::Unauthenticated(
            "Malformed authorization header".into(),
        ));
    }
    Ok(token.trim())
}

/// Require a valid token whose user holds one of the gate's roles.
pub async fn require_role(State(gate): State<RoleGate>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token.to_string(),
        Err(err) => return err.into_response(),
    };
    let RoleGate { records, roles } = gate;
    let user = match run_blocking(move || records.authorize(&token, roles)).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(user_id = user.id, role = %user.role, path = %req.uri().path(), "authorized");
    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}
