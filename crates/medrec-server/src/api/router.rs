//! API router.
//!
//! Public routes: `/token`, `/register`, `/verify-token` (checks its own token).
//! Every other route group sits behind [`require_role`] with the group's allow-list.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use medrec_core::models::Role;

use crate::api::endpoints::{admin, auth, bio_analyst, doctor, patient, pharmacist};
use crate::api::middleware::{require_role, RoleGate};
use crate::api::types::AppState;

const PATIENT: &[Role] = &[Role::Patient];
const DOCTOR: &[Role] = &[Role::Doctor];
const PHARMACIST: &[Role] = &[Role::Pharmacist];
const BIO_ANALYST: &[Role] = &[Role::BioAnalyst];
const ADMIN: &[Role] = &[Role::Admin];

/// Build the full API router with request tracing.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/token", post(auth::login))
        .route("/register", post(auth::register))
        .route("/verify-token", get(auth::verify));

    let patient_routes = Router::new()
        .route("/profile/status", get(patient::profile_status))
        .route(
            "/profile",
            get(patient::get_profile)
                .post(patient::create_profile)
                .put(patient::update_profile),
        )
        .route("/prescriptions", get(patient::prescriptions))
        .route("/lab-tests", get(patient::lab_tests))
        .route_layer(from_fn_with_state(
            RoleGate::new(&state, PATIENT),
            require_role,
        ));

    let doctor_routes = Router::new()
        .route("/profile/status", get(doctor::profile_status))
        .route(
            "/profile",
            get(doctor::get_profile)
                .post(doctor::create_profile)
                .put(doctor::update_profile),
        )
        .route("/patients", get(doctor::list_patients))
        .route("/patients/:id", get(doctor::get_patient))
        .route(
            "/prescriptions",
            get(doctor::list_prescriptions).post(doctor::create_prescription),
        )
        .route("/prescriptions/:id", get(doctor::get_prescription))
        .route_layer(from_fn_with_state(
            RoleGate::new(&state, DOCTOR),
            require_role,
        ));

    let pharmacist_routes = Router::new()
        .route("/prescriptions", get(pharmacist::list_prescriptions))
        .route("/prescriptions/:id", get(pharmacist::get_prescription))
        .route("/prescriptions/:id/fill", post(pharmacist::fill))
        .route("/prescriptions/:id/fills", get(pharmacist::fills))
        .route_layer(from_fn_with_state(
            RoleGate::new(&state, PHARMACIST),
            require_role,
        ));

    let bio_analyst_routes = Router::new()
        .route("/test", post(bio_analyst::upload))
        .route("/tests", get(bio_analyst::list).post(bio_analyst::upload))
        .route("/tests/:id", get(bio_analyst::detail))
        .route("/tests/:id/file", get(bio_analyst::download))
        .route("/patients/:id/tests", get(bio_analyst::for_patient))
        .route_layer(from_fn_with_state(
            RoleGate::new(&state, BIO_ANALYST),
            require_role,
        ))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/active", put(admin::set_active))
        .route_layer(from_fn_with_state(
            RoleGate::new(&state, ADMIN),
            require_role,
        ));

    Router::new()
        .merge(public)
        .nest("/patient", patient_routes)
        .nest("/doctor", doctor_routes)
        .nest("/pharmacist", pharmacist_routes)
        .nest("/bio-analyst", bio_analyst_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins; `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any())
}
