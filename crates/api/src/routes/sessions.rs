//! Session lifecycle endpoints
//!
//! # Auth Requirements
//!
//! | Endpoint | Auth | Notes |
//! |----------|------|-------|
//! | `POST /sessions` | Required | Idempotent on client_upload_id |
//! | `POST /sessions/{id}/finalize` | Required | Owner only, idempotent |
//! | `GET /sessions/{id}` | Required | Owner only |
//! | `GET /sessions` | Required | Owner-scoped, paginated |

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use suburi_control::repos::files::NewSessionFile;
use suburi_model::{
    CapabilityGrant, CaptureSession, CreateSessionRequest, CreateSessionResponse, FinalizeRequest,
    FinalizeResponse, SessionDetail, SessionSummary, session::validate_sha256_hex,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request/Response types
// =============================================================================

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

/// List response
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub limit: u32,
    pub offset: u32,
}

// =============================================================================
// Routes
// =============================================================================

/// Session routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/", get(list_sessions))
        .route("/{id}", get(get_session))
        .route("/{id}/finalize", post(finalize_session))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a capture session (idempotent)
///
/// POST /api/v1/sessions
///
/// A retried request with the same client upload id returns the first
/// recorded session with status 200 instead of creating a duplicate; the
/// retry's payload is ignored even if it differs.
async fn create_session(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    if req.client_upload_id.is_empty() {
        return Err(ApiError::validation("client_upload_id", "must not be empty"));
    }
    if req.device_info.hw_id.is_empty() {
        return Err(ApiError::validation("device_info.hw_id", "must not be empty"));
    }
    if let Some(hz) = req.nominal_hz
        && !(hz.is_finite() && hz > 0.0)
    {
        return Err(ApiError::validation("nominal_hz", "must be positive"));
    }

    // Idempotency ledger first: retried creates land here
    if let Some(session_id) = state
        .catalog
        .uploads()
        .find_session(&user.id, &req.client_upload_id)
        .await?
    {
        let session = state
            .catalog
            .sessions()
            .get(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("session", session_id))?;

        debug!(
            session_id,
            client_upload_id = %req.client_upload_id,
            "Returning existing session for retried create"
        );
        let response = grant_response(&state, session);
        return Ok((StatusCode::OK, Json(response)));
    }

    let device_id = state.catalog.devices().upsert(&user.id, &req.device_info).await?;

    let session = match state
        .catalog
        .sessions()
        .create_with_ledger(&user.id, device_id, &req)
        .await
    {
        Ok(session) => session,
        // Lost a race against a concurrent retry: the first insert wins
        Err(suburi_control::ControlError::AlreadyExists { .. }) => {
            let session_id = state
                .catalog
                .uploads()
                .find_session(&user.id, &req.client_upload_id)
                .await?
                .ok_or_else(|| ApiError::internal("ledger row vanished after conflict"))?;
            let session = state
                .catalog
                .sessions()
                .get(session_id)
                .await?
                .ok_or_else(|| ApiError::not_found("session", session_id))?;

            let response = grant_response(&state, session);
            return Ok((StatusCode::OK, Json(response)));
        }
        Err(e) => return Err(e.into()),
    };

    info!(session_id = session.id, user_id = %user.id, "Capture session created");
    let response = grant_response(&state, session);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Finalize the session manifest (idempotent)
///
/// POST /api/v1/sessions/{id}/finalize
async fn finalize_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, ApiError> {
    let session = state
        .catalog
        .sessions()
        .get(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("session", session_id))?;

    if session.user_id != user.id {
        return Err(ApiError::forbidden("session belongs to a different user"));
    }

    // Idempotent replay: return the cached summary from the catalog
    if let Some(end_time) = session.end_time {
        let totals = state.catalog.files().totals(session_id).await?;
        debug!(session_id, "Session already finalized, returning cached summary");
        return Ok(Json(FinalizeResponse {
            session_id,
            total_files: totals.total_files,
            total_bytes: totals.total_bytes,
            total_samples: totals.total_samples,
            end_time_utc: end_time,
            already_finalized: true,
        }));
    }

    if req.end_time_utc < session.start_time {
        return Err(ApiError::validation(
            "end_time_utc",
            "must not precede the session start",
        ));
    }

    let scope = AppState::session_scope(&user.id, session_id);

    // Validate manifest entries before touching anything
    for file in &req.files {
        if file.filename.is_empty() || file.filename.contains('/') {
            return Err(ApiError::validation("files.filename", "must be a bare file name"));
        }
        if let Some(sha) = &file.sha256_hex {
            validate_sha256_hex(&file.filename, sha)
                .map_err(|e| ApiError::validation("files.sha256_hex", e.to_string()))?;
        }
    }

    // Verify every claimed file against the backing store. Checksums are
    // client-claimed payload identity, not verified content - only
    // existence and size are checked here.
    let mut missing = Vec::new();
    for file in &req.files {
        let path = format!("{}{}", scope, file.filename);
        match state.store.head(&path).await? {
            None => missing.push(file.filename.clone()),
            Some(actual) => {
                let actual = actual as i64;
                if file.bytes_size > 0 && actual != file.bytes_size {
                    return Err(ApiError::SizeMismatch {
                        filename: file.filename.clone(),
                        claimed: file.bytes_size,
                        actual,
                    });
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::MissingFiles(missing));
    }

    // Register files (idempotent per (session, purpose, path))
    let mut total_bytes = 0i64;
    let mut total_samples = 0i64;
    for file in &req.files {
        let new_file = NewSessionFile {
            purpose: file.purpose,
            storage_url: format!("{}{}", scope, file.filename),
            content_type: file.content_type.clone(),
            bytes_size: file.bytes_size,
            sha256_hex: file.sha256_hex.clone(),
            num_samples: file.num_samples,
        };
        state.catalog.files().register(session_id, &new_file).await?;

        total_bytes += file.bytes_size;
        total_samples += file.num_samples.unwrap_or(0);
    }

    // Close the session; rate stats are optional and set the measured rate
    let actual_mean_hz = req.rate_stats.as_ref().map(|s| s.mean_hz);
    state
        .catalog
        .sessions()
        .finalize(session_id, req.end_time_utc, actual_mean_hz)
        .await?;

    if let Some(stats) = &req.rate_stats {
        state.catalog.stats().insert_once(session_id, stats).await?;
    }

    info!(
        session_id,
        total_files = req.files.len(),
        total_bytes,
        total_samples,
        "Finalized session manifest"
    );

    Ok(Json(FinalizeResponse {
        session_id,
        total_files: req.files.len() as i64,
        total_bytes,
        total_samples,
        end_time_utc: req.end_time_utc,
        already_finalized: false,
    }))
}

/// Get one session with files and stats
///
/// GET /api/v1/sessions/{id}
async fn get_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<SessionDetail>, ApiError> {
    let session = state
        .catalog
        .sessions()
        .get(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("session", session_id))?;

    if session.user_id != user.id {
        return Err(ApiError::forbidden("session belongs to a different user"));
    }

    let files = state.catalog.files().list_for_session(session_id).await?;
    let rate_stats = state.catalog.stats().get(session_id).await?;
    let device = state.catalog.devices().get(session.device_id).await?;

    Ok(Json(SessionDetail {
        session_id: session.id,
        user_id: session.user_id,
        device_id: session.device_id,
        start_time_utc: session.start_time,
        end_time_utc: session.end_time,
        nominal_hz: session.nominal_hz,
        actual_mean_hz: session.actual_mean_hz,
        coord_frame: session.coord_frame,
        gravity_removed: session.gravity_removed,
        game_session_id: session.game_session_id,
        action_type: session.action_type,
        notes: session.notes,
        created_at: session.created_at,
        device,
        files,
        rate_stats,
    }))
}

/// List the caller's sessions
///
/// GET /api/v1/sessions?limit={n}&offset={n}
async fn list_sessions(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let limit = query.limit.clamp(1, 200);

    let sessions = state
        .catalog
        .sessions()
        .list(&user.id, limit, query.offset)
        .await?;

    let summaries = sessions
        .into_iter()
        .map(|(s, file_count)| SessionSummary {
            session_id: s.id,
            start_time_utc: s.start_time,
            end_time_utc: s.end_time,
            nominal_hz: s.nominal_hz,
            actual_mean_hz: s.actual_mean_hz,
            coord_frame: s.coord_frame,
            action_type: s.action_type,
            file_count,
        })
        .collect();

    Ok(Json(ListSessionsResponse {
        sessions: summaries,
        limit,
        offset: query.offset,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Mint a fresh capability grant and build the create response
fn grant_response(state: &AppState, session: CaptureSession) -> CreateSessionResponse {
    let scope = AppState::session_scope(&session.user_id, session.id);
    let (token, expires_at) = state.signer.mint(&scope, state.token_ttl);

    CreateSessionResponse {
        session_id: session.id,
        user_id: session.user_id,
        device_id: session.device_id,
        start_time_utc: session.start_time,
        nominal_hz: session.nominal_hz,
        coord_frame: session.coord_frame,
        game_session_id: session.game_session_id,
        action_type: session.action_type,
        capability: CapabilityGrant {
            container: state.container.clone(),
            path: scope,
            token,
            expires_at,
        },
    }
}
