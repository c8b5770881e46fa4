//! Catalog integration tests over an in-memory database

use chrono::{TimeZone, Utc};

use suburi_model::{
    CoordFrame, CreateSessionRequest, DeviceInfo, FilePurpose, Platform, RateStats,
};

use crate::repos::files::NewSessionFile;
use crate::{Catalog, ControlError};

fn device() -> DeviceInfo {
    DeviceInfo {
        platform: Platform::Ios,
        model: Some("iPhone15,2".to_string()),
        os_version: Some("17.4".to_string()),
        app_version: Some("1.0.0".to_string()),
        hw_id: "hw-abc".to_string(),
    }
}

fn create_request(upload_id: &str) -> CreateSessionRequest {
    CreateSessionRequest {
        client_upload_id: upload_id.to_string(),
        device_info: device(),
        start_time_utc: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        nominal_hz: Some(100.0),
        coord_frame: CoordFrame::Device,
        gravity_removed: true,
        game_session_id: None,
        action_type: Some("men".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn test_device_upsert_is_stable_per_hw_id() {
    let catalog = Catalog::new_memory().await.unwrap();

    let first = catalog.devices().upsert("user-1", &device()).await.unwrap();
    let mut updated = device();
    updated.os_version = Some("17.5".to_string());
    let second = catalog.devices().upsert("user-1", &updated).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(catalog.devices().count().await.unwrap(), 1);

    let stored = catalog.devices().get(first).await.unwrap().unwrap();
    assert_eq!(stored.os_version.as_deref(), Some("17.5"));
}

#[tokio::test]
async fn test_session_create_and_fetch() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();

    let req = create_request("upload-1");
    let session = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &req)
        .await
        .unwrap();

    assert!(session.id > 0);
    assert!(!session.is_finalized());
    assert_eq!(session.nominal_hz, Some(100.0));
    assert_eq!(session.action_type.as_deref(), Some("men"));
    assert_eq!(session.coord_frame, CoordFrame::Device);

    let fetched = catalog.sessions().get(session.id).await.unwrap().unwrap();
    assert_eq!(fetched.start_time, req.start_time_utc);
}

#[tokio::test]
async fn test_ledger_blocks_duplicate_upload_id() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();

    let req = create_request("upload-dup");
    let first = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &req)
        .await
        .unwrap();

    let err = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &req)
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::AlreadyExists { .. }));

    // The ledger resolves back to the first session
    let found = catalog
        .uploads()
        .find_session("user-1", "upload-dup")
        .await
        .unwrap();
    assert_eq!(found, Some(first.id));

    // A different user may reuse the same upload id
    let other_device = catalog.devices().upsert("user-2", &device()).await.unwrap();
    assert!(catalog
        .sessions()
        .create_with_ledger("user-2", other_device, &req)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_finalize_sets_end_time_and_mean_rate() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();
    let session = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &create_request("upload-2"))
        .await
        .unwrap();

    let end = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();
    catalog
        .sessions()
        .finalize(session.id, end, Some(99.7))
        .await
        .unwrap();

    let fetched = catalog.sessions().get(session.id).await.unwrap().unwrap();
    assert_eq!(fetched.end_time, Some(end));
    assert_eq!(fetched.actual_mean_hz, Some(99.7));

    // Finalize without stats leaves the mean rate null
    let session2 = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &create_request("upload-3"))
        .await
        .unwrap();
    catalog
        .sessions()
        .finalize(session2.id, end, None)
        .await
        .unwrap();
    let fetched2 = catalog.sessions().get(session2.id).await.unwrap().unwrap();
    assert!(fetched2.actual_mean_hz.is_none());
}

#[tokio::test]
async fn test_file_registration_is_idempotent() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();
    let session = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &create_request("upload-4"))
        .await
        .unwrap();

    let file = NewSessionFile {
        purpose: FilePurpose::Raw,
        storage_url: "users/user-1/sessions/1/chunk-000001.jsonl".to_string(),
        content_type: Some("application/x-ndjson".to_string()),
        bytes_size: 2048,
        sha256_hex: Some("ab".repeat(32)),
        num_samples: Some(100),
    };

    catalog.files().register(session.id, &file).await.unwrap();
    catalog.files().register(session.id, &file).await.unwrap();

    let files = catalog.files().list_for_session(session.id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].bytes_size, 2048);
    assert_eq!(files[0].num_samples, Some(100));

    let totals = catalog.files().totals(session.id).await.unwrap();
    assert_eq!(totals.total_files, 1);
    assert_eq!(totals.total_bytes, 2048);
    assert_eq!(totals.total_samples, 100);
}

#[tokio::test]
async fn test_stats_insert_at_most_once() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();
    let session = catalog
        .sessions()
        .create_with_ledger("user-1", device_id, &create_request("upload-5"))
        .await
        .unwrap();

    let stats = RateStats {
        samples_total: 10_000,
        duration_ms: 100_000.0,
        mean_hz: 100.0,
        dt_ms_p50: 10.0,
        dt_ms_p95: 11.5,
        dt_ms_max: 25.0,
        dropped_seq_pct: Some(0.1),
    };

    assert!(catalog.stats().insert_once(session.id, &stats).await.unwrap());
    assert!(!catalog.stats().insert_once(session.id, &stats).await.unwrap());

    let stored = catalog.stats().get(session.id).await.unwrap().unwrap();
    assert_eq!(stored, stats);
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_paginated() {
    let catalog = Catalog::new_memory().await.unwrap();
    let device_id = catalog.devices().upsert("user-1", &device()).await.unwrap();

    for i in 0..5 {
        catalog
            .sessions()
            .create_with_ledger("user-1", device_id, &create_request(&format!("up-{}", i)))
            .await
            .unwrap();
    }

    let page = catalog.sessions().list("user-1", 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    // Newest first
    assert!(page[0].0.id > page[1].0.id);

    let rest = catalog.sessions().list("user-1", 10, 2).await.unwrap();
    assert_eq!(rest.len(), 3);

    assert!(catalog.sessions().list("user-2", 10, 0).await.unwrap().is_empty());
}
