//! End-to-end capture lifecycle tests
//!
//! Runs the real ingestion service on a loopback port and drives the
//! controller through record → chunk → upload → finalize, plus the
//! crash-recovery and offline-queue branches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use suburi_api::auth::{LocalJwtProvider, test_utils};
use suburi_api::{AppState, build_router};
use suburi_capture::{
    CaptureConfig, CaptureController, CaptureState, ChunkEntry, ChunkState, IngestClient, Journal,
    ReplaySource, ResumeOutcome, RetryPolicy, SessionOutcome, SessionParams, Uploader,
};
use suburi_control::Catalog;
use suburi_model::{
    ChunkMeta, CoordFrame, CreateSessionRequest, DeviceInfo, InertialSample, Platform,
    SCHEMA_VERSION, Vec3,
};
use suburi_store::{CapabilitySigner, LocalFsStore};

async fn spawn_server() -> (String, Arc<Catalog>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(Catalog::new_memory().await.unwrap());
    let store = Arc::new(LocalFsStore::new(dir.path()));
    let auth = Arc::new(LocalJwtProvider::new(test_utils::TEST_SECRET));
    let signer = CapabilitySigner::new(test_utils::TEST_SECRET);

    let state = AppState::new(catalog.clone(), store, auth, signer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), catalog, dir)
}

fn params() -> SessionParams {
    SessionParams {
        device_info: DeviceInfo {
            platform: Platform::Ios,
            model: Some("iPhone15,2".to_string()),
            os_version: Some("17.4".to_string()),
            app_version: Some("1.0.0".to_string()),
            hw_id: "hw-e2e".to_string(),
        },
        coord_frame: CoordFrame::Device,
        gravity_removed: true,
        game_session_id: None,
        action_type: Some("men".to_string()),
        notes: None,
    }
}

/// Stillness, one swing, stillness - at 10 ms spacing
fn session_samples() -> Vec<InertialSample> {
    let mut mags = vec![0.3f32; 30];
    mags.extend(vec![10.0; 40]);
    mags.extend(vec![0.3; 50]);

    mags.iter()
        .enumerate()
        .map(|(i, &m)| {
            InertialSample::new(
                i as i64 * 10_000_000,
                i as i64,
                Vec3::new(m, 0.0, 0.0),
                Vec3::ZERO,
                Vec3::new(m, 0.0, 9.81),
            )
        })
        .collect()
}

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(5),
        max_attempts: 2,
    }
}

#[tokio::test]
async fn test_full_lifecycle_records_uploads_and_finalizes() {
    let (base_url, catalog, _server_dir) = spawn_server().await;
    let local_dir = tempfile::tempdir().unwrap();

    let mut config = CaptureConfig::new(local_dir.path());
    config.buffer_limit = 50; // 120 samples → 3 chunks

    let client = IngestClient::new(&base_url, test_utils::token_for("user-1"));
    let mut controller = CaptureController::new(config, client);
    assert_eq!(controller.state(), CaptureState::Idle);

    let source = ReplaySource::new(session_samples());
    let session_id = controller.on_session_start(params(), source).await.unwrap();
    assert_eq!(controller.state(), CaptureState::Recording);

    // Give the sampler thread time to drain the replayed samples
    tokio::time::sleep(Duration::from_millis(200)).await;

    let outcome = controller.on_session_end().await.unwrap();
    assert_eq!(controller.state(), CaptureState::Done);

    let SessionOutcome::Completed {
        response,
        rate_stats,
        analysis,
    } = outcome
    else {
        panic!("expected completed session");
    };

    assert_eq!(response.session_id, session_id);
    assert_eq!(response.total_files, 3);
    assert_eq!(response.total_samples, 120);
    assert!(!response.already_finalized);

    let stats = rate_stats.expect("120 samples produce stats");
    assert!((stats.mean_hz - 100.0).abs() < 2.0);
    assert!((stats.dt_ms_p50 - 10.0).abs() < 1e-6);

    let analysis = analysis.expect("analysis runs on captured samples");
    assert_eq!(analysis.swings.len(), 1);
    assert!(analysis.swings[0].ended_in_stillness);

    // Server catalog agrees
    let session = catalog.sessions().get(session_id).await.unwrap().unwrap();
    assert!(session.is_finalized());
    assert!((session.actual_mean_hz.unwrap() - stats.mean_hz).abs() < 1e-6);
    let files = catalog.files().list_for_session(session_id).await.unwrap();
    assert_eq!(files.len(), 3);

    // Local session directory cleaned up after finalize
    let leftover: Vec<_> = std::fs::read_dir(local_dir.path().join("sessions"))
        .map(|rd| rd.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(leftover.is_empty());
}

#[tokio::test]
async fn test_lifecycle_transitions_are_enforced() {
    let (base_url, _catalog, _server_dir) = spawn_server().await;
    let local_dir = tempfile::tempdir().unwrap();

    let client = IngestClient::new(&base_url, test_utils::token_for("user-1"));
    let mut controller = CaptureController::new(CaptureConfig::new(local_dir.path()), client);

    // Ending while idle is a protocol bug, not a silent no-op
    let err = controller.on_session_end().await.unwrap_err();
    assert!(err.to_string().contains("invalid transition"));
}

#[tokio::test]
async fn test_uploader_queues_chunks_when_server_unreachable() {
    let local_dir = tempfile::tempdir().unwrap();
    let session_dir = local_dir.path().join("sessions/upload-queued");

    // Write a real chunk and journal as the collector would have
    let meta = chunk_meta(1);
    let written =
        suburi_capture::write_chunk(&session_dir, &meta, 0, &session_samples()[..50]).unwrap();

    let mut journal = Journal::new(create_request("upload-queued"), Some(1));
    journal.chunks.push(ChunkEntry {
        filename: written.filename.clone(),
        bytes_size: written.bytes_size,
        sha256_hex: written.sha256_hex.clone(),
        num_samples: written.num_samples,
        state: ChunkState::Pending,
    });
    journal.save(&session_dir).unwrap();

    // Nothing listens on this port
    let client = IngestClient::new("http://127.0.0.1:9", "irrelevant");
    let uploader = Uploader::new(client, quick_retry(), 2);
    let grant = suburi_model::CapabilityGrant {
        container: "capture".to_string(),
        path: "users/user-1/sessions/1/".to_string(),
        token: "unused".to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    };

    let cancel = CancellationToken::new();
    let report = uploader
        .upload_pending(&grant, &mut journal, &session_dir, &cancel)
        .await
        .unwrap();

    // Queued for later, not lost: journal still lists the chunk pending
    assert!(!report.all_uploaded());
    assert_eq!(report.queued, vec![written.filename]);
    let reloaded = Journal::load(&session_dir).unwrap();
    assert_eq!(reloaded.pending().len(), 1);
}

#[tokio::test]
async fn test_resume_reattaches_and_finalizes_orphaned_session() {
    let (base_url, catalog, _server_dir) = spawn_server().await;
    let local_dir = tempfile::tempdir().unwrap();
    let session_dir = local_dir.path().join("sessions/upload-resume");

    // Simulate a crash mid-recording: chunks and journal on disk, no
    // stats, no end time, session never created server-side
    let meta = chunk_meta(0);
    let samples = session_samples();
    let chunk1 = suburi_capture::write_chunk(&session_dir, &meta, 0, &samples[..60]).unwrap();
    let chunk2 = suburi_capture::write_chunk(&session_dir, &meta, 1, &samples[60..]).unwrap();

    let mut journal = Journal::new(create_request("upload-resume"), None);
    for written in [&chunk1, &chunk2] {
        journal.chunks.push(ChunkEntry {
            filename: written.filename.clone(),
            bytes_size: written.bytes_size,
            sha256_hex: written.sha256_hex.clone(),
            num_samples: written.num_samples,
            state: ChunkState::Pending,
        });
    }
    journal.save(&session_dir).unwrap();

    let mut config = CaptureConfig::new(local_dir.path());
    config.retry = quick_retry();
    let client = IngestClient::new(&base_url, test_utils::token_for("user-1"));
    let mut controller = CaptureController::new(config, client);

    let outcomes = controller.resume_pending().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    let ResumeOutcome::Finalized {
        client_upload_id,
        response,
    } = &outcomes[0]
    else {
        panic!("expected finalized resume, got {:?}", outcomes[0]);
    };
    assert_eq!(client_upload_id, "upload-resume");
    assert_eq!(response.total_files, 2);
    assert_eq!(response.total_samples, 120);

    // Recovered stats landed in the catalog
    let session = catalog
        .sessions()
        .get(response.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(session.is_finalized());
    assert!(session.actual_mean_hz.is_some());

    // Session directory consumed
    assert!(!session_dir.exists());
}

#[tokio::test]
async fn test_resume_discards_stale_sessions() {
    let (base_url, _catalog, _server_dir) = spawn_server().await;
    let local_dir = tempfile::tempdir().unwrap();
    let session_dir = local_dir.path().join("sessions/upload-stale");

    let mut journal = Journal::new(create_request("upload-stale"), None);
    journal.created_at = Utc::now() - chrono::Duration::days(30);
    journal.save(&session_dir).unwrap();

    let client = IngestClient::new(&base_url, test_utils::token_for("user-1"));
    let mut controller = CaptureController::new(CaptureConfig::new(local_dir.path()), client);

    let outcomes = controller.resume_pending().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], ResumeOutcome::Discarded { .. }));
    assert!(!session_dir.exists());
}

// =============================================================================
// Fixtures
// =============================================================================

fn chunk_meta(session_id: i64) -> ChunkMeta {
    ChunkMeta {
        schema_version: SCHEMA_VERSION.to_string(),
        session_id,
        user_id: "user-1".to_string(),
        device_id: 1,
        session_start_utc: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        nominal_hz: Some(100.0),
        coord_frame: CoordFrame::Device,
        gravity_removed: true,
        chunk_index: 0,
    }
}

fn create_request(upload_id: &str) -> CreateSessionRequest {
    CreateSessionRequest {
        client_upload_id: upload_id.to_string(),
        device_info: params().device_info,
        start_time_utc: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        nominal_hz: Some(100.0),
        coord_frame: CoordFrame::Device,
        gravity_removed: true,
        game_session_id: None,
        action_type: None,
        notes: None,
    }
}
