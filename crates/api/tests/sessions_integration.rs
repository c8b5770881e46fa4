//! Integration tests for the session lifecycle endpoints
//!
//! Drives the full router with in-memory catalog and a tempdir-backed
//! object store: create → upload → finalize → read back.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use suburi_api::auth::{LocalJwtProvider, test_utils};
use suburi_api::{AppState, build_router};
use suburi_control::Catalog;
use suburi_store::{CapabilitySigner, LocalFsStore};

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(Catalog::new_memory().await.unwrap());
    let store = Arc::new(LocalFsStore::new(dir.path()));
    let auth = Arc::new(LocalJwtProvider::new(test_utils::TEST_SECRET));
    let signer = CapabilitySigner::new(test_utils::TEST_SECRET);

    let state = AppState::new(catalog, store, auth, signer);
    (build_router(state), dir)
}

fn json_request(method: Method, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_body(upload_id: &str) -> Value {
    json!({
        "client_upload_id": upload_id,
        "device_info": {
            "platform": "ios",
            "model": "iPhone15,2",
            "os_version": "17.4",
            "hw_id": "hw-1"
        },
        "start_time_utc": "2025-06-01T12:00:00Z",
        "nominal_hz": 100.0,
        "coord_frame": "device",
        "action_type": "men"
    })
}

/// Create a session and upload one chunk; returns (session_id, chunk bytes)
async fn create_and_upload(app: &Router, token: &str, upload_id: &str) -> (i64, usize) {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions",
            token,
            create_body(upload_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;

    let session_id = body["session_id"].as_i64().unwrap();
    let cap_token = body["capability"]["token"].as_str().unwrap().to_string();
    let path = body["capability"]["path"].as_str().unwrap().to_string();

    let chunk = b"{\"schema_version\":\"1\"}\n{\"timestamp_ns\":0}\n";
    let uri = format!(
        "/storage/{}chunk-000001.jsonl?token={}",
        path,
        urlencode(&cap_token)
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(uri)
                .body(Body::from(chunk.to_vec()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    (session_id, chunk.len())
}

fn urlencode(s: &str) -> String {
    s.replace('/', "%2F").replace(':', "%3A")
}

#[tokio::test]
async fn test_session_endpoints_require_auth() {
    let (app, _dir) = test_app().await;

    for (uri, method) in [
        ("/api/v1/sessions", Method::POST),
        ("/api/v1/sessions", Method::GET),
        ("/api/v1/sessions/1", Method::GET),
        ("/api/v1/sessions/1/finalize", Method::POST),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {} without auth",
            uri
        );
    }
}

#[tokio::test]
async fn test_create_session_is_idempotent() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");

    let first = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions",
            &token,
            create_body("upload-1"),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body = body_json(first).await;
    let session_id = first_body["session_id"].as_i64().unwrap();

    // Retry with the same upload id: same session, 200 instead of 201
    let retry = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions",
            &token,
            create_body("upload-1"),
        ))
        .await
        .unwrap();
    assert_eq!(retry.status(), StatusCode::OK);
    let retry_body = body_json(retry).await;
    assert_eq!(retry_body["session_id"].as_i64().unwrap(), session_id);

    // A fresh capability grant is minted either way
    assert!(retry_body["capability"]["token"].as_str().is_some());
    assert_eq!(
        retry_body["capability"]["path"].as_str().unwrap(),
        format!("users/user-1/sessions/{}/", session_id)
    );
}

#[tokio::test]
async fn test_create_session_validation() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");

    let mut body = create_body("upload-v");
    body["client_upload_id"] = json!("");
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/sessions", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown platform is rejected at deserialization
    let mut body = create_body("upload-v2");
    body["device_info"]["platform"] = json!("playdate");
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/sessions", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_finalize_happy_path_with_rate_stats() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");
    let (session_id, chunk_len) = create_and_upload(&app, &token, "upload-f1").await;

    let finalize = json!({
        "end_time_utc": "2025-06-01T12:05:00Z",
        "files": [{
            "filename": "chunk-000001.jsonl",
            "purpose": "raw",
            "bytes_size": chunk_len,
            "sha256_hex": "ab".repeat(32),
            "num_samples": 2,
            "content_type": "application/x-ndjson"
        }],
        "rate_stats": {
            "samples_total": 2,
            "duration_ms": 10.0,
            "mean_hz": 200.0,
            "dt_ms_p50": 10.0,
            "dt_ms_p95": 10.0,
            "dt_ms_max": 10.0
        }
    });

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{}/finalize", session_id),
            &token,
            finalize,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_files"], 1);
    assert_eq!(body["total_bytes"].as_i64().unwrap(), chunk_len as i64);
    assert_eq!(body["total_samples"], 2);
    assert_eq!(body["already_finalized"], false);

    // Detail reflects the finalize
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/sessions/{}", session_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["actual_mean_hz"].as_f64().unwrap(), 200.0);
    assert_eq!(detail["files"].as_array().unwrap().len(), 1);
    assert_eq!(detail["rate_stats"]["mean_hz"].as_f64().unwrap(), 200.0);
    assert_eq!(detail["device"]["platform"], "ios");
}

#[tokio::test]
async fn test_finalize_is_idempotent() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");
    let (session_id, chunk_len) = create_and_upload(&app, &token, "upload-f2").await;

    let finalize = json!({
        "end_time_utc": "2025-06-01T12:05:00Z",
        "files": [{
            "filename": "chunk-000001.jsonl",
            "purpose": "raw",
            "bytes_size": chunk_len,
            "num_samples": 2
        }],
        "rate_stats": {
            "samples_total": 2,
            "duration_ms": 10.0,
            "mean_hz": 200.0,
            "dt_ms_p50": 10.0,
            "dt_ms_p95": 10.0,
            "dt_ms_max": 10.0
        }
    });

    let uri = format!("/api/v1/sessions/{}/finalize", session_id);
    let first = app
        .clone()
        .oneshot(json_request(Method::POST, &uri, &token, finalize.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;

    let second = app
        .clone()
        .oneshot(json_request(Method::POST, &uri, &token, finalize))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_json(second).await;

    // Identical summary, flagged as a replay
    assert_eq!(second_body["already_finalized"], true);
    for field in ["total_files", "total_bytes", "total_samples", "end_time_utc"] {
        assert_eq!(first_body[field], second_body[field], "field {}", field);
    }
}

#[tokio::test]
async fn test_finalize_rejects_size_mismatch() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");
    let (session_id, chunk_len) = create_and_upload(&app, &token, "upload-f3").await;

    let finalize = json!({
        "end_time_utc": "2025-06-01T12:05:00Z",
        "files": [{
            "filename": "chunk-000001.jsonl",
            "purpose": "raw",
            "bytes_size": chunk_len + 17
        }]
    });

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{}/finalize", session_id),
            &token,
            finalize,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "SIZE_MISMATCH");

    // Rejection must not finalize the session
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/sessions/{}", session_id),
            &token,
        ))
        .await
        .unwrap();
    let detail = body_json(response).await;
    assert!(detail["end_time_utc"].is_null());
}

#[tokio::test]
async fn test_finalize_rejects_missing_files() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");
    let (session_id, _) = create_and_upload(&app, &token, "upload-f4").await;

    let finalize = json!({
        "end_time_utc": "2025-06-01T12:05:00Z",
        "files": [{
            "filename": "never-uploaded.jsonl",
            "purpose": "raw",
            "bytes_size": 10
        }]
    });

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{}/finalize", session_id),
            &token,
            finalize,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "MISSING_FILES");
}

#[tokio::test]
async fn test_finalize_without_rate_stats_leaves_mean_null() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");
    let (session_id, _) = create_and_upload(&app, &token, "upload-f5").await;

    // Empty file list and no rate_stats: the backward-compatible path
    let finalize = json!({ "end_time_utc": "2025-06-01T12:05:00Z" });

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{}/finalize", session_id),
            &token,
            finalize,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/sessions/{}", session_id),
            &token,
        ))
        .await
        .unwrap();
    let detail = body_json(response).await;
    assert!(detail["actual_mean_hz"].is_null());
    assert!(detail.get("rate_stats").is_none() || detail["rate_stats"].is_null());
    assert!(!detail["end_time_utc"].is_null());
}

#[tokio::test]
async fn test_sessions_are_owner_scoped() {
    let (app, _dir) = test_app().await;
    let owner = test_utils::token_for("user-1");
    let intruder = test_utils::token_for("user-2");
    let (session_id, _) = create_and_upload(&app, &owner, "upload-f6").await;

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/sessions/{}", session_id),
            &intruder,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{}/finalize", session_id),
            &intruder,
            json!({ "end_time_utc": "2025-06-01T12:05:00Z" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And the intruder's list does not include it
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/sessions", &intruder))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_session_is_404() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/sessions/9999", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pagination() {
    let (app, _dir) = test_app().await;
    let token = test_utils::token_for("user-1");

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/sessions",
                &token,
                create_body(&format!("upload-l{}", i)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/sessions?limit=2", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/sessions?limit=2&offset=2", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_expired_bearer_token_rejected() {
    let (app, _dir) = test_app().await;
    let token = test_utils::expired_token_for("user-1");

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/sessions", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
