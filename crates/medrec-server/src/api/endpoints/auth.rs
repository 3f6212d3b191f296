//! `POST /token`, `GET /verify-token`, `POST /register`.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Form, Json};
use serde::Deserialize;

use medrec_core::models::{NewUser, User};
use medrec_core::{AccessToken, TokenIdentity};

use crate::api::error::ApiError;
use crate::api::middleware::bearer_token;
use crate::api::types::AppState;

/// OAuth2 password-grant style login form.
#[derive(Deserialize)]
pub struct LoginForm {
    /// The account email
    pub username: String,
    pub password: String,
}

/// `POST /token`: exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<AccessToken>, ApiError> {
    let Form(form) = form?;
    let token = state
        .call(move |records| records.login(&form.username, &form.password))
        .await?;
    Ok(Json(token))
}

/// `GET /verify-token`: report the identity behind the presented token.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenIdentity>, ApiError> {
    let token = bearer_token(&headers)?.to_string();
    Ok(Json(state.call(move |records| records.verify_token(&token)).await?))
}

/// `POST /register`: create an account.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new_user) = payload?;
    let user = state.call(move |records| records.register(new_user)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
