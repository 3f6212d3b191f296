//! `/patient/*`: a patient's own profile, prescriptions and lab tests.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use medrec_core::models::{LabTest, Patient, PatientProfileInput, PatientUpdate, Prescription};
use medrec_core::ProfileStatus;

use crate::api::error::ApiError;
use crate::api::types::{AppState, CurrentUser};

pub async fn profile_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ProfileStatus>, ApiError> {
    let status = state
        .call(move |records| records.patient_profile_status(&user))
        .await?;
    Ok(Json(status))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.call(move |records| records.patient_profile(&user)).await?))
}

pub async fn create_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<PatientProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(input) = payload?;
    let patient = state
        .call(move |records| records.create_patient_profile(&user, input))
        .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(update) = payload?;
    let patient = state
        .call(move |records| records.update_patient_profile(&user, update))
        .await?;
    Ok(Json(patient))
}

pub async fn prescriptions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let rxs = state
        .call(move |records| records.patient_prescriptions(&user))
        .await?;
    Ok(Json(rxs))
}

pub async fn lab_tests(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<LabTest>>, ApiError> {
    Ok(Json(state.call(move |records| records.patient_lab_tests(&user)).await?))
}
