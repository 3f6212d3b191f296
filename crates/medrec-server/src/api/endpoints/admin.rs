//! `/admin/*`: account listing and activation.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use medrec_core::models::User;

use crate::api::error::ApiError;
use crate::api::types::{AppState, CurrentUser};

#[derive(Deserialize)]
pub struct ActivationRequest {
    pub is_active: bool,
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.call(|records| records.list_users()).await?))
}

pub async fn set_active(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ActivationRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(user_id) = user_id?;
    let Json(request) = payload?;
    let user = state
        .call(move |records| records.set_user_active(&admin, user_id, request.is_active))
        .await?;
    Ok(Json(user))
}
