//! HTTP-level tests driving the router with `tower::ServiceExt::oneshot`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medrec_core::{Database, LabResultStore, MedicalRecords, PasswordHasher, TokenService};
use medrec_server::{build_router, AppState};

const SECRET: &[u8] = b"api-test-secret-api-test-secret-00";
const PASSWORD: &str = "open sesame";
const BOUNDARY: &str = "medrec-test-boundary";

struct TestApp {
    router: Router,
    records: MedicalRecords,
    _dir: tempfile::TempDir,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap().to_string()
    }
}

fn test_app(max_upload_bytes: usize) -> TestApp {
    app_with_db(Database::open_in_memory().unwrap(), tempfile::tempdir().unwrap(), max_upload_bytes)
}

fn app_with_db(db: Database, dir: tempfile::TempDir, max_upload_bytes: usize) -> TestApp {
    let records = MedicalRecords::new(
        db,
        TokenService::new(SECRET, Duration::from_secs(1800)),
        PasswordHasher::new(4),
        LabResultStore::open(dir.path().join("labs")).unwrap(),
    );
    TestApp {
        router: build_router(AppState::new(records.clone(), max_upload_bytes)),
        records,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .unwrap()
            .to_vec();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn get(&self, uri: &str, token: &str) -> Reply {
        self.json(Method::GET, uri, Some(token), None).await
    }

    async fn register(&self, email: &str, role: &str) -> Reply {
        let body = json!({
            "email": email,
            "password": PASSWORD,
            "first_name": "Jo",
            "last_name": role.to_lowercase(),
            "role": role,
        });
        self.json(Method::POST, "/register", None, Some(body)).await
    }

    async fn login(&self, email: &str, password: &str) -> Reply {
        let form = format!(
            "username={}&password={}",
            email.replace('@', "%40"),
            password.replace(' ', "+")
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    /// Register and log in, returning the bearer token.
    async fn user(&self, email: &str, role: &str) -> String {
        assert_eq!(self.register(email, role).await.status, StatusCode::CREATED);
        let reply = self.login(email, PASSWORD).await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.json()["access_token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: &str, path: &str, patient_id: i64, file: &[u8]) -> Reply {
        let mut body = Vec::new();
        for (name, value) in [
            ("patient_id", patient_id.to_string()),
            ("test_name", "Lipid panel".to_string()),
            ("notes", "fasting 12h".to_string()),
        ] {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"lipids.csv\"\r\nContent-Type: text/csv\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

fn patient_profile() -> Value {
    json!({
        "date_of_birth": "1988-02-29",
        "phone_number": "555-0110",
        "address": "12 Birch Ln",
        "blood_type": "AB+",
        "allergies": null,
        "emergency_contact_name": "Lee",
        "emergency_contact_number": "555-0111",
        "medical_history": "none",
    })
}

fn doctor_profile(license: &str) -> Value {
    json!({
        "specialty": "Internal medicine",
        "license_number": license,
        "phone_number": "555-0120",
    })
}

/// Patient with a profile; returns (token, patient id).
async fn patient_with_profile(app: &TestApp) -> (String, i64) {
    let token = app.user("pat@example.org", "PATIENT").await;
    let reply = app
        .json(Method::POST, "/patient/profile", Some(&token), Some(patient_profile()))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let id = reply.json()["id"].as_i64().unwrap();
    (token, id)
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let app = test_app(1024 * 1024);
    let reply = app.json(Method::GET, "/patient/profile", None, None).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(reply.error_code(), "UNAUTHENTICATED");

    let reply = app.get("/patient/profile", "garbage").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let app = test_app(1024 * 1024);
    let token = app.user("pat@example.org", "PATIENT").await;

    for path in [
        "/doctor/patients",
        "/pharmacist/prescriptions",
        "/bio-analyst/tests",
        "/admin/users",
    ] {
        let reply = app.get(path, &token).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(reply.error_code(), "FORBIDDEN");
    }
}

#[tokio::test]
async fn test_registration_rules() {
    let app = test_app(1024 * 1024);

    let reply = app.register("new@example.org", "DOCTOR").await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let user = reply.json();
    assert_eq!(user["email"], "new@example.org");
    assert_eq!(user["role"], "DOCTOR");
    assert_eq!(user["is_active"], true);
    assert!(user.get("password_hash").is_none());

    let reply = app.register("NEW@example.org", "PATIENT").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.error_code(), "CONFLICT");

    let reply = app.register("root@example.org", "ADMIN").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.register("who@example.org", "JANITOR").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_and_verify_token() {
    let app = test_app(1024 * 1024);
    app.register("rx@example.org", "PHARMACIST").await;

    let reply = app.login("rx@example.org", "wrong").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app.login("rx@example.org", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 1800);
    let token = body["access_token"].as_str().unwrap();

    let reply = app.get("/verify-token", token).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"is_valid": true, "email": "rx@example.org", "role": "PHARMACIST"})
    );
}

#[tokio::test]
async fn test_profiles() {
    let app = test_app(1024 * 1024);
    let (patient, _) = patient_with_profile(&app).await;

    let reply = app.get("/patient/profile/status", &patient).await;
    assert_eq!(reply.json()["has_profile"], true);

    let reply = app
        .json(Method::POST, "/patient/profile", Some(&patient), Some(patient_profile()))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = app
        .json(
            Method::PUT,
            "/patient/profile",
            Some(&patient),
            Some(json!({"address": "14 Birch Ln"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["address"], "14 Birch Ln");
    assert_eq!(reply.json()["blood_type"], "AB+");

    let doctor = app.user("doc@example.org", "DOCTOR").await;
    let reply = app.get("/doctor/profile", &doctor).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    let reply = app
        .json(Method::POST, "/doctor/profile", Some(&doctor), Some(doctor_profile("MD-1")))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json()["full_name"], "Jo doctor");

    let other = app.user("doc2@example.org", "DOCTOR").await;
    let reply = app
        .json(Method::POST, "/doctor/profile", Some(&other), Some(doctor_profile("MD-1")))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = app.get("/doctor/patients", &doctor).await;
    let patients = reply.json();
    assert_eq!(patients.as_array().unwrap().len(), 1);
    assert_eq!(patients[0]["patient_name"], "Jo patient");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app(1024 * 1024);
    let token = app.user("pat@example.org", "PATIENT").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/patient/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let app = test_app(1024 * 1024);
    let pharmacist = app.user("rx@example.org", "PHARMACIST").await;
    let analyst = app.user("lab@example.org", "BIO_ANALYST").await;

    for (uri, token) in [
        ("/pharmacist/prescriptions/abc", &pharmacist),
        ("/pharmacist/prescriptions/abc/fills", &pharmacist),
        ("/bio-analyst/tests/1.5/file", &analyst),
    ] {
        let reply = app.get(uri, token).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            reply.headers[header::CONTENT_TYPE],
            "application/json",
            "{uri}"
        );
        assert_eq!(reply.error_code(), "BAD_REQUEST", "{uri}");
    }

    let reply = app
        .json(
            Method::POST,
            "/pharmacist/prescriptions/abc/fill",
            Some(&pharmacist),
            Some(json!({ "quantity_dispensed": "30 tablets" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_prescription_fill_ceiling() {
    let app = test_app(1024 * 1024);
    let (patient, patient_id) = patient_with_profile(&app).await;
    let doctor = app.user("doc@example.org", "DOCTOR").await;
    let pharmacist = app.user("rx@example.org", "PHARMACIST").await;
    app.json(Method::POST, "/doctor/profile", Some(&doctor), Some(doctor_profile("MD-9")))
        .await;

    let reply = app
        .json(
            Method::POST,
            "/doctor/prescriptions",
            Some(&doctor),
            Some(json!({
                "patient_id": patient_id,
                "medication_name": "Metformin",
                "dosage": "500mg",
                "frequency": "twice daily",
                "duration": "30 days",
                "max_refills": 2,
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let rx_id = reply.json()["id"].as_i64().unwrap();

    let fill_uri = format!("/pharmacist/prescriptions/{rx_id}/fill");
    let fill = json!({"quantity_dispensed": "60 tablets"});
    for expected in 1..=3 {
        let reply = app
            .json(Method::POST, &fill_uri, Some(&pharmacist), Some(fill.clone()))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json()["times_filled"], expected);
    }

    let reply = app
        .json(Method::POST, &fill_uri, Some(&pharmacist), Some(fill))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.error_code(), "FILL_LIMIT_EXCEEDED");

    let reply = app
        .get(&format!("/pharmacist/prescriptions/{rx_id}/fills"), &pharmacist)
        .await;
    assert_eq!(reply.json().as_array().unwrap().len(), 3);

    let reply = app.get("/patient/prescriptions", &patient).await;
    let mine = reply.json();
    assert_eq!(mine[0]["is_filled"], true);
    assert_eq!(mine[0]["times_filled"], 3);

    let reply = app
        .get(&format!("/doctor/prescriptions/{rx_id}"), &doctor)
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = app.get("/pharmacist/prescriptions/999", &pharmacist).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fill_waiting_on_locked_database_does_not_stall_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("medrec.db");
    let app = app_with_db(Database::open(&db_path).unwrap(), dir, 1024 * 1024);
    let (_, patient_id) = patient_with_profile(&app).await;
    let doctor = app.user("doc@example.org", "DOCTOR").await;
    let pharmacist = app.user("rx@example.org", "PHARMACIST").await;
    app.json(Method::POST, "/doctor/profile", Some(&doctor), Some(doctor_profile("MD-4")))
        .await;
    let reply = app
        .json(
            Method::POST,
            "/doctor/prescriptions",
            Some(&doctor),
            Some(json!({
                "patient_id": patient_id,
                "medication_name": "Lisinopril",
                "dosage": "10mg",
                "frequency": "daily",
                "duration": "90 days",
                "max_refills": 1,
            })),
        )
        .await;
    let rx_id = reply.json()["id"].as_i64().unwrap();

    // A second connection holds the write lock, so the fill waits on the busy timeout.
    let locker = Database::open(&db_path).unwrap();
    locker.conn().execute_batch("BEGIN IMMEDIATE").unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/pharmacist/prescriptions/{rx_id}/fill"))
        .header(header::AUTHORIZATION, format!("Bearer {pharmacist}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"quantity_dispensed": "30 tablets"}"#))
        .unwrap();
    let pending = tokio::spawn(app.router.clone().oneshot(request));

    // Single-threaded runtime: this timer only fires on time if the fill is off the worker.
    let started = std::time::Instant::now();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    locker.conn().execute_batch("COMMIT").unwrap();
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_lab_upload_and_download() {
    let app = test_app(1024 * 1024);
    let (patient, patient_id) = patient_with_profile(&app).await;
    let analyst = app.user("lab@example.org", "BIO_ANALYST").await;

    let contents = b"ldl,hdl\n100,60\n";
    let reply = app
        .upload(&analyst, "/bio-analyst/test", patient_id, contents)
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let test = reply.json();
    assert_eq!(test["original_filename"], "lipids.csv");
    assert_eq!(test["content_type"], "text/csv");
    assert_eq!(test["size_bytes"], contents.len());
    assert!(test.get("file_ref").is_none());
    let test_id = test["id"].as_i64().unwrap();

    let reply = app
        .get(&format!("/bio-analyst/tests/{test_id}/file"), &analyst)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers.get(header::CONTENT_TYPE).unwrap(), "text/csv");
    assert_eq!(
        reply.headers.get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"lipids.csv\""
    );
    assert_eq!(reply.body, contents);

    let reply = app
        .upload(&analyst, "/bio-analyst/tests", patient_id, b"second")
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = app
        .get(&format!("/bio-analyst/patients/{patient_id}/tests"), &analyst)
        .await;
    assert_eq!(reply.json().as_array().unwrap().len(), 2);
    let reply = app.get("/patient/lab-tests", &patient).await;
    assert_eq!(reply.json().as_array().unwrap().len(), 2);

    let reply = app.upload(&analyst, "/bio-analyst/test", 4242, b"x").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_limit() {
    let app = test_app(1024);
    let (_, patient_id) = patient_with_profile(&app).await;
    let analyst = app.user("lab@example.org", "BIO_ANALYST").await;

    let reply = app
        .upload(&analyst, "/bio-analyst/test", patient_id, &vec![b'a'; 4096])
        .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_admin_deactivation_revokes_access() {
    let app = test_app(1024 * 1024);
    app.records
        .ensure_admin("admin@example.org", "admin-pass")
        .unwrap();
    let admin = app.login("admin@example.org", "admin-pass").await.json()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let patient = app.user("pat@example.org", "PATIENT").await;

    let reply = app.get("/admin/users", &admin).await;
    let users = reply.json();
    let patient_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "pat@example.org")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let reply = app
        .json(
            Method::PUT,
            &format!("/admin/users/{patient_id}/active"),
            Some(&admin),
            Some(json!({"is_active": false})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["is_active"], false);

    let reply = app.get("/patient/profile/status", &patient).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    let reply = app.login("pat@example.org", PASSWORD).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
