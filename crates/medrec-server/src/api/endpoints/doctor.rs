//! `/doctor/*`: profile, patient lookup and prescribing.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use medrec_core::models::{
    DoctorProfile, DoctorProfileInput, DoctorUpdate, NewPrescription, PatientRecord, Prescription,
};
use medrec_core::ProfileStatus;

use crate::api::error::ApiError;
use crate::api::types::{AppState, CurrentUser};

pub async fn profile_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ProfileStatus>, ApiError> {
    let status = state
        .call(move |records| records.doctor_profile_status(&user))
        .await?;
    Ok(Json(status))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<DoctorProfile>, ApiError> {
    Ok(Json(state.call(move |records| records.doctor_profile(&user)).await?))
}

pub async fn create_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<DoctorProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DoctorProfile>), ApiError> {
    let Json(input) = payload?;
    let profile = state
        .call(move |records| records.create_doctor_profile(&user, input))
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<DoctorUpdate>, JsonRejection>,
) -> Result<Json<DoctorProfile>, ApiError> {
    let Json(update) = payload?;
    let profile = state
        .call(move |records| records.update_doctor_profile(&user, update))
        .await?;
    Ok(Json(profile))
}

pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    Ok(Json(state.call(|records| records.list_patients()).await?))
}

pub async fn get_patient(
    State(state): State<AppState>,
    patient_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PatientRecord>, ApiError> {
    let Path(patient_id) = patient_id?;
    Ok(Json(state.call(move |records| records.patient_record(patient_id)).await?))
}

pub async fn create_prescription(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<NewPrescription>, JsonRejection>,
) -> Result<(StatusCode, Json<Prescription>), ApiError> {
    let Json(order) = payload?;
    let rx = state
        .call(move |records| records.create_prescription(&user, order))
        .await?;
    Ok((StatusCode::CREATED, Json(rx)))
}

pub async fn list_prescriptions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let rxs = state
        .call(move |records| records.doctor_prescriptions(&user))
        .await?;
    Ok(Json(rxs))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Prescription>, ApiError> {
    let Path(id) = id?;
    let rx = state
        .call(move |records| records.doctor_prescription(&user, id))
        .await?;
    Ok(Json(rx))
}
