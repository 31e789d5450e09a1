use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::FromRequest,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use crate::app;
use crate::auth::{issue_token, verify_token, Claims};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{memory::Seed, models::ChaletImage, MemoryStore};
use crate::images::{DisabledImageStore, ImageError, ImageStore, ImageUpload};
use crate::state::AppState;

use super::reservations::StatusUpdate;
use super::JsonBody;

const SECRET: &str = "handler-test-secret";
const OLIVIA: &str = "0b7e6a52-3c1f-4d8e-9a51-6f2d9c0e1a01";
const MARCO: &str = "0b7e6a52-3c1f-4d8e-9a51-6f2d9c0e1a02";
const PINE_LODGE: &str = "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e01";
const BIRCH_CABIN: &str = "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e02";
const MARCO_CHALET: &str = "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e03";
const LATE_BOOKING: &str = "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f01";
const EARLY_BOOKING: &str = "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f02";
const MARCO_BOOKING: &str = "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f03";

/// Records uploads and hands back predictable URLs.
#[derive(Default)]
struct RecordingImageStore {
    received: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn upload(&self, upload: ImageUpload) -> Result<ChaletImage, ImageError> {
        self.received.lock().unwrap().push(upload.file_name.clone());
        Ok(ChaletImage {
            secure_url: format!("https://images.test/{}", upload.file_name),
            public_id: format!("chalets/{}", upload.file_name),
        })
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.security.jwt_secret = SECRET.to_string();
    config.security.bcrypt_cost = 4;
    config
}

fn seed() -> Seed {
    serde_json::from_value(json!({
        "owners": [
            { "id": OLIVIA, "username": "olivia", "email": "olivia@example.com", "password": "correct-horse" },
            { "id": MARCO, "username": "marco", "email": "marco@example.com", "password": "battery-staple" }
        ],
        "renters": [
            { "id": "3e4f5a6b-7c8d-4e9f-8a1b-2c3d4e5f6a01", "username": "rita", "email": "rita@example.com" }
        ],
        "chalets": [
            { "id": PINE_LODGE, "owner_id": OLIVIA, "name": "Pine Lodge", "location": "Chamonix", "pricing": 180.0, "capacity": 6 },
            { "id": BIRCH_CABIN, "owner_id": OLIVIA, "name": "Birch Cabin", "location": "Zermatt", "pricing": 240.0, "capacity": 4 },
            { "id": MARCO_CHALET, "owner_id": MARCO, "name": "Alpenblick", "location": "Verbier", "pricing": 300.0 }
        ],
        "reservations": [
            { "id": LATE_BOOKING, "chalet_id": PINE_LODGE, "user_id": "3e4f5a6b-7c8d-4e9f-8a1b-2c3d4e5f6a01", "date": "2026-02-10T00:00:00Z" },
            { "id": EARLY_BOOKING, "chalet_id": BIRCH_CABIN, "user_id": "3e4f5a6b-7c8d-4e9f-8a1b-2c3d4e5f6a01", "date": "2026-01-05T00:00:00Z" },
            { "id": MARCO_BOOKING, "chalet_id": MARCO_CHALET, "user_id": "3e4f5a6b-7c8d-4e9f-8a1b-2c3d4e5f6a01", "date": "2026-01-20T00:00:00Z" }
        ]
    }))
    .unwrap()
}

async fn router_with(images: Arc<dyn ImageStore>) -> Router {
    let config = config();
    let store = MemoryStore::new();
    store.seed(seed(), config.security.bcrypt_cost).await.unwrap();
    app(AppState::new(config, Arc::new(store), images))
}

async fn router() -> Router {
    router_with(Arc::new(RecordingImageStore::default())).await
}

fn token_for(subject: &str) -> String {
    issue_token(subject, &config().security).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_request(uri: &str, token: &str, files: &[(&str, &str)]) -> Request<Body> {
    const BOUNDARY: &str = "chalet-test-boundary";
    let mut body = String::new();
    for (field, file_name) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

// Register

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let request = json_request(
        "POST",
        "/owner/register",
        None,
        json!({ "username": "newbie", "email": "not-an-email", "password": "short" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations = body.as_array().unwrap();
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0]["path"], json!(["email"]));
    assert_eq!(violations[0]["rule"], "string.email");
    assert_eq!(violations[1]["path"], json!(["password"]));
    assert_eq!(violations[1]["message"], "\"password\" length must be at least 8 characters long");
}

#[tokio::test]
async fn register_creates_owner_without_exposing_hash() {
    let request = json_request(
        "POST",
        "/owner/register",
        None,
        json!({ "username": "newbie", "email": "newbie@example.com", "password": "long-enough" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Owner registered successfully");
    assert_eq!(body["owner"]["email"], "newbie@example.com");
    assert!(body["owner"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_refuses_taken_email() {
    let request = json_request(
        "POST",
        "/owner/register",
        None,
        json!({ "username": "copycat", "email": "olivia@example.com", "password": "long-enough" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already exists");
}

#[tokio::test]
async fn register_accepts_json_without_content_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/owner/register")
        .body(Body::from(
            json!({ "username": "plain", "email": "plain@example.com", "password": "long-enough" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner"]["username"], "plain");
}

#[tokio::test]
async fn body_type_mismatch_uses_error_shape() {
    let request = Request::builder()
        .method("PATCH")
        .uri("/")
        .body(Body::from(r#"{"status": 5}"#))
        .unwrap();
    let err = match JsonBody::<StatusUpdate>::from_request(request, &()).await {
        Ok(_) => panic!("numeric status must not deserialize"),
        Err(err) => err,
    };
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let response = err.into_response();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

// Login

#[tokio::test]
async fn login_returns_token_for_owner() {
    let request = json_request(
        "POST",
        "/owner/login",
        None,
        json!({ "email": "olivia@example.com", "password": "correct-horse" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let claims = verify_token(body["token"].as_str().unwrap(), &config().security).unwrap();
    assert_eq!(claims.sub, OLIVIA);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let request = json_request(
        "POST",
        "/owner/login",
        None,
        json!({ "email": "olivia@example.com", "password": "wrong-password" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid password");
}

#[tokio::test]
async fn login_for_unknown_email_is_not_found() {
    let request = json_request(
        "POST",
        "/owner/login",
        None,
        json!({ "email": "nobody@example.com", "password": "whatever-it-is" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Owner not found");
}

// Reservations

#[tokio::test]
async fn reservations_require_a_token() {
    let (status, body) = send(router().await, get_request("/owner/reservations", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let mut claims = Claims::new(OLIVIA, 0);
    claims.iat -= 7200;
    claims.exp -= 3600;
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = send(router().await, get_request("/owner/reservations", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn reservations_list_only_own_chalets_by_date() {
    let token = token_for(OLIVIA);
    let (status, body) = send(router().await, get_request("/owner/reservations", Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Reservations fetched successfully");
    assert_eq!(body["chalets"].as_array().unwrap().len(), 2);

    let reservations = body["reservations"].as_array().unwrap();
    let ids: Vec<&str> = reservations.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![EARLY_BOOKING, LATE_BOOKING]);
    assert_eq!(reservations[0]["chalet"]["name"], "Birch Cabin");
    assert_eq!(reservations[0]["user"]["username"], "rita");
}

#[tokio::test]
async fn reservations_reject_malformed_subject() {
    let token = token_for("not-a-uuid");
    let (status, body) = send(router().await, get_request("/owner/reservations", Some(&token))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid owner ID format");
}

#[tokio::test]
async fn reservation_status_update_validates_before_authenticating() {
    let request = json_request("PATCH", "/owner/reservations/abc", None, json!({ "status": "maybe" }));
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations = body.as_array().unwrap();
    assert_eq!(violations[0]["section"], "body");
    assert_eq!(violations[0]["message"], "\"status\" must be one of [accepted, rejected]");
    assert_eq!(violations[1]["section"], "params");
}

#[tokio::test]
async fn reservation_status_update_succeeds_for_owner() {
    let token = token_for(OLIVIA);
    let request = json_request(
        "PATCH",
        &format!("/owner/reservations/{}", LATE_BOOKING),
        Some(&token),
        json!({ "status": "accepted" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Reservation accepted successfully");
    assert_eq!(body["reservation"]["status"], "accepted");
}

#[tokio::test]
async fn reservation_on_another_owners_chalet_is_not_found() {
    let token = token_for(OLIVIA);
    let request = json_request(
        "PATCH",
        &format!("/owner/reservations/{}", MARCO_BOOKING),
        Some(&token),
        json!({ "status": "rejected" }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Reservation not found");
}

// Chalets

#[tokio::test]
async fn chalet_edit_applies_allowed_fields() {
    let token = token_for(OLIVIA);
    let request = json_request(
        "PATCH",
        &format!("/owner/chalets/{}", PINE_LODGE),
        Some(&token),
        json!({ "pricing": 199.5, "amenities": ["sauna", "fireplace"] }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chalet information updated successfully");
    assert_eq!(body["chalet"]["pricing"], 199.5);
    assert_eq!(body["chalet"]["amenities"], json!(["sauna", "fireplace"]));
    assert_eq!(body["chalet"]["name"], "Pine Lodge");
}

#[tokio::test]
async fn chalet_edit_accepts_integral_float_capacity() {
    let token = token_for(OLIVIA);
    let request = json_request(
        "PATCH",
        &format!("/owner/chalets/{}", PINE_LODGE),
        Some(&token),
        json!({ "capacity": 3.0 }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chalet"]["capacity"], 3);
}

#[tokio::test]
async fn chalet_edit_rejects_fields_outside_allow_list() {
    let token = token_for(OLIVIA);
    let request = json_request(
        "PATCH",
        &format!("/owner/chalets/{}", PINE_LODGE),
        Some(&token),
        json!({ "name": "Renamed", "owner_id": MARCO }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body[0]["rule"], "object.unknown");
    assert_eq!(body[0]["message"], "\"owner_id\" is not allowed");
}

#[tokio::test]
async fn chalet_edit_by_non_owner_is_not_found() {
    let token = token_for(MARCO);
    let request = json_request(
        "PATCH",
        &format!("/owner/chalets/{}", PINE_LODGE),
        Some(&token),
        json!({ "capacity": 2 }),
    );
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chalet not found or you do not own this chalet");
}

#[tokio::test]
async fn image_upload_appends_every_file() {
    let images = Arc::new(RecordingImageStore::default());
    let router = router_with(images.clone()).await;
    let token = token_for(OLIVIA);
    let request = multipart_request(
        &format!("/owner/chalets/{}/images", PINE_LODGE),
        &token,
        &[("images", "front.jpg"), ("images", "deck.jpg"), ("notes", "ignored.txt")],
    );
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chalet images uploaded successfully");
    let stored = body["chalet"]["images"].as_array().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["secure_url"], "https://images.test/front.jpg");
    assert_eq!(images.received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn image_upload_without_files_is_rejected() {
    let token = token_for(OLIVIA);
    let request = multipart_request(&format!("/owner/chalets/{}/images", PINE_LODGE), &token, &[]);
    let (status, body) = send(router().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No images provided");
}

#[tokio::test]
async fn image_upload_without_object_store_is_unavailable() {
    let router = router_with(Arc::new(DisabledImageStore)).await;
    let token = token_for(OLIVIA);
    let request = multipart_request(
        &format!("/owner/chalets/{}/images", PINE_LODGE),
        &token,
        &[("images", "front.jpg")],
    );
    let (status, _) = send(router, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// Details

#[tokio::test]
async fn owner_details_list_chalets_with_pricing() {
    let (status, body) = send(router().await, get_request(&format!("/owner/details/{}", MARCO), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "marco");
    assert_eq!(body["email"], "marco@example.com");
    assert_eq!(
        body["chalets"],
        json!([{ "id": MARCO_CHALET, "name": "Alpenblick", "location": "Verbier", "pricing": 300.0 }])
    );
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn owner_details_for_unknown_owner_is_not_found() {
    let uri = format!("/owner/details/{}", Uuid::new_v4());
    let (status, body) = send(router().await, get_request(&uri, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Owner not found");
}

#[tokio::test]
async fn owner_details_reject_malformed_id() {
    let (status, body) = send(router().await, get_request("/owner/details/12345", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body[0]["rule"], "string.pattern.name");
    assert_eq!(body[0]["path"], json!(["ownerId"]));
}
