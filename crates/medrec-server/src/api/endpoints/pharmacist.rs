//! `/pharmacist/*`: prescription lookup and fills.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};

use medrec_core::models::{FillRequest, Prescription, PrescriptionFill};

use crate::api::error::ApiError;
use crate::api::types::{AppState, CurrentUser};

pub async fn list_prescriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    Ok(Json(state.call(|records| records.list_prescriptions()).await?))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Prescription>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.call(move |records| records.prescription(id)).await?))
}

/// `POST /pharmacist/prescriptions/:id/fill`: returns the updated prescription.
pub async fn fill(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FillRequest>, JsonRejection>,
) -> Result<Json<Prescription>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let rx = state
        .call(move |records| records.fill_prescription(&user, id, request))
        .await?;
    Ok(Json(rx))
}

pub async fn fills(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<PrescriptionFill>>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.call(move |records| records.prescription_fills(id)).await?))
}
