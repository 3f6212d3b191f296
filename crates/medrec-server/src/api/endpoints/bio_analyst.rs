//! `/bio-analyst/*`: lab result upload and retrieval.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use medrec_core::models::{LabTest, NewLabTest, Upload};

use crate::api::error::ApiError;
use crate::api::types::{AppState, CurrentUser};

/// Fields of the upload form, collected in any order.
#[derive(Default)]
struct UploadForm {
    patient_id: Option<i64>,
    test_name: Option<String>,
    notes: Option<String>,
    file: Option<Upload>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "patient_id" => {
                    let raw = field.text().await?;
                    let id = raw.trim().parse::<i64>().map_err(|_| {
                        ApiError::BadRequest(format!("patient_id is not an integer: {raw}"))
                    })?;
                    form.patient_id = Some(id);
                }
                "test_name" => form.test_name = Some(field.text().await?),
                "notes" => {
                    let notes = field.text().await?;
                    form.notes = Some(notes).filter(|n| !n.trim().is_empty());
                }
                "file" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?.to_vec();
                    form.file = Some(Upload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn into_parts(self) -> Result<(NewLabTest, Upload), ApiError> {
        let missing = |name: &str| ApiError::BadRequest(format!("missing form field: {name}"));
        let meta = NewLabTest {
            patient_id: self.patient_id.ok_or_else(|| missing("patient_id"))?,
            test_name: self.test_name.ok_or_else(|| missing("test_name"))?,
            notes: self.notes,
        };
        let upload = self.file.ok_or_else(|| missing("file"))?;
        Ok((meta, upload))
    }
}

/// `POST /bio-analyst/test`: multipart upload of a lab result.
pub async fn upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<LabTest>), ApiError> {
    let (meta, upload) = UploadForm::read(multipart?).await?.into_parts()?;
    let test = state
        .call(move |records| records.create_lab_test(&user, meta, upload))
        .await?;
    Ok((StatusCode::CREATED, Json(test)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<LabTest>>, ApiError> {
    Ok(Json(state.call(|records| records.list_lab_tests()).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<LabTest>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.call(move |records| records.lab_test(id)).await?))
}

pub async fn for_patient(
    State(state): State<AppState>,
    patient_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<LabTest>>, ApiError> {
    let Path(patient_id) = patient_id?;
    let tests = state
        .call(move |records| records.lab_tests_for_patient(patient_id))
        .await?;
    Ok(Json(tests))
}

/// `GET /bio-analyst/tests/:id/file`: download with the original name and type.
pub async fn download(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let file = state.call(move |records| records.lab_test_file(id)).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment_name(&file.filename)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// Filename safe to place inside a quoted `Content-Disposition` parameter.
fn attachment_name(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
