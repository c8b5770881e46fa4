//! Capture lifecycle controller
//!
//! Owns one capture at a time and couples it to the external activity
//! session: `on_session_start` creates the server session and begins
//! sampling, `on_session_end` flushes, analyzes, uploads and finalizes.
//! One instance per active recording, owned by whatever composes the
//! activity and capture subsystems - there is no global singleton.
//!
//! # Concurrency
//!
//! The sampler thread is the single writer into the sample channel; the
//! collector task is the single owner of the buffer, chunk rotation and
//! the journal. Analysis and uploads run after recording stops and cannot
//! jitter live sampling. A disk failure while rotating a chunk abandons
//! that chunk with a warning; the sampling loop keeps running.

use std::path::PathBuf;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use suburi_kinematics::IntegratorConfig;
use suburi_model::{
    CapabilityGrant, ChunkMeta, CoordFrame, CreateSessionRequest, DeviceInfo, FilePurpose,
    FinalizeRequest, FinalizeResponse, InertialSample, ManifestFile, RateStats, SCHEMA_VERSION,
};
use suburi_motion::SegmentationConfig;

use crate::analysis::{SessionAnalysis, analyze};
use crate::chunk;
use crate::client::IngestClient;
use crate::error::{CaptureError, Result};
use crate::journal::{ChunkEntry, ChunkState, Journal};
use crate::source::SampleSource;
use crate::stats::compute_rate_stats;
use crate::uploader::{RetryPolicy, Uploader};

/// Content type claimed for chunk files
const CHUNK_CONTENT_TYPE: &str = "application/x-ndjson";

// =============================================================================
// Configuration
// =============================================================================

/// Controller configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Local root for session directories and journals
    pub data_dir: PathBuf,

    /// Requested sample rate passed to the server. A request only; true
    /// timestamps are recorded as delivered.
    pub target_hz: f64,

    /// Samples buffered in memory before rotating into a chunk file
    pub buffer_limit: usize,

    /// Sampler → collector channel depth; absorbs rotation latency
    pub channel_capacity: usize,

    /// Simultaneous chunk transfers
    pub upload_concurrency: usize,

    /// Upload retry policy
    pub retry: RetryPolicy,

    /// Journals older than this are discarded at resume instead of
    /// re-attached
    pub max_resume_age: ChronoDuration,

    pub segmentation: SegmentationConfig,
    pub integrator: IntegratorConfig,
}

impl CaptureConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            target_hz: 100.0,
            buffer_limit: 10_000,
            channel_capacity: 4096,
            upload_concurrency: 2,
            retry: RetryPolicy::default(),
            max_resume_age: ChronoDuration::days(7),
            segmentation: SegmentationConfig::default(),
            integrator: IntegratorConfig::default(),
        }
    }

    fn sessions_root(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

/// Capture metadata supplied by the app at session start
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub device_info: DeviceInfo,
    pub coord_frame: CoordFrame,
    pub gravity_removed: bool,
    pub game_session_id: Option<String>,
    pub action_type: Option<String>,
    pub notes: Option<String>,
}

impl SessionParams {
    fn to_request(
        &self,
        client_upload_id: String,
        start_time: DateTime<Utc>,
        nominal_hz: f64,
    ) -> CreateSessionRequest {
        CreateSessionRequest {
            client_upload_id,
            device_info: self.device_info.clone(),
            start_time_utc: start_time,
            nominal_hz: Some(nominal_hz),
            coord_frame: self.coord_frame,
            gravity_removed: self.gravity_removed,
            game_session_id: self.game_session_id.clone(),
            action_type: self.action_type.clone(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// States and outcomes
// =============================================================================

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Finalizing,
    Uploading,
    Done,
    /// Reattaching orphaned chunks at process start
    Resume,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Resume => "resume",
        }
    }
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// Uploaded and finalized
    Completed {
        response: FinalizeResponse,
        rate_stats: Option<RateStats>,
        analysis: Option<SessionAnalysis>,
    },
    /// Some chunks could not be transferred; everything is journaled and
    /// a later `resume_pending` will pick it up. Not data loss.
    QueuedOffline {
        client_upload_id: String,
        pending_chunks: Vec<String>,
    },
}

/// Result of reattaching one orphaned session
#[derive(Debug)]
pub enum ResumeOutcome {
    Finalized {
        client_upload_id: String,
        response: FinalizeResponse,
    },
    StillQueued {
        client_upload_id: String,
        pending_chunks: Vec<String>,
    },
    Discarded {
        client_upload_id: String,
        reason: String,
    },
}

// =============================================================================
// Controller
// =============================================================================

struct ActiveCapture {
    session_id: i64,
    grant: CapabilityGrant,
    dir: PathBuf,
    stop: CancellationToken,
    sampler: tokio::task::JoinHandle<Result<()>>,
    collector: tokio::task::JoinHandle<CollectorOutput>,
}

struct CollectorOutput {
    journal: Journal,
    timestamps: Vec<i64>,
    sequences: Vec<i64>,
    chunk_write_failures: u32,
}

/// The capture lifecycle controller
pub struct CaptureController {
    config: CaptureConfig,
    client: IngestClient,
    state: CaptureState,
    active: Option<ActiveCapture>,
}

impl CaptureController {
    pub fn new(config: CaptureConfig, client: IngestClient) -> Self {
        Self {
            config,
            client,
            state: CaptureState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// External activity session started: create the server session and
    /// begin sampling from `source`.
    pub async fn on_session_start(
        &mut self,
        params: SessionParams,
        source: impl SampleSource,
    ) -> Result<i64> {
        if !matches!(self.state, CaptureState::Idle | CaptureState::Done) {
            return Err(CaptureError::InvalidState {
                state: self.state.as_str(),
                event: "session_start",
            });
        }

        let client_upload_id = Uuid::new_v4().to_string();
        let start_time = Utc::now();
        let request = params.to_request(client_upload_id.clone(), start_time, self.config.target_hz);

        let (response, already_exists) = self.client.create_session(&request).await?;
        debug_assert!(!already_exists, "fresh upload id cannot collide");

        let dir = self.config.sessions_root().join(&client_upload_id);
        let mut journal = Journal::new(request, Some(response.session_id));
        journal.save(&dir)?;

        let meta = ChunkMeta {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: response.session_id,
            user_id: response.user_id.clone(),
            device_id: response.device_id,
            session_start_utc: start_time,
            nominal_hz: response.nominal_hz,
            coord_frame: response.coord_frame,
            gravity_removed: params.gravity_removed,
            chunk_index: 0,
        };

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let stop = CancellationToken::new();

        let sampler_stop = stop.clone();
        let sampler =
            tokio::task::spawn_blocking(move || sampler_loop(source, tx, sampler_stop));

        let collector = tokio::spawn(collect(
            rx,
            dir.clone(),
            meta,
            journal,
            self.config.buffer_limit,
        ));

        self.active = Some(ActiveCapture {
            session_id: response.session_id,
            grant: response.capability,
            dir,
            stop,
            sampler,
            collector,
        });
        self.state = CaptureState::Recording;

        info!(
            session_id = response.session_id,
            client_upload_id = %client_upload_id,
            target_hz = self.config.target_hz,
            "Recording started"
        );
        Ok(response.session_id)
    }

    /// External activity session ended: flush, analyze, upload, finalize.
    pub async fn on_session_end(&mut self) -> Result<SessionOutcome> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::InvalidState {
                state: self.state.as_str(),
                event: "session_end",
            });
        }
        let active = self
            .active
            .take()
            .ok_or_else(|| CaptureError::Internal("recording state without capture".into()))?;

        self.state = CaptureState::Finalizing;
        active.stop.cancel();

        // The sampler finishing closes the channel; the collector then
        // flushes the final partial chunk and returns.
        match active.sampler.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Sampler ended with error; continuing with captured data")
            }
            Err(e) => warn!(error = %e, "Sampler task failed"),
        }

        let mut output = active
            .collector
            .await
            .map_err(|e| CaptureError::Internal(format!("collector task failed: {}", e)))?;

        if output.chunk_write_failures > 0 {
            warn!(
                failures = output.chunk_write_failures,
                "Some chunks were abandoned due to disk errors"
            );
        }

        let end_time = Utc::now();
        let rate_stats = compute_rate_stats(&output.timestamps, &output.sequences);

        // Segmentation + integration on a worker, reading samples back
        // from the chunk files
        let analysis = run_analysis(
            &active.dir,
            &output.journal,
            &self.config.segmentation,
            &self.config.integrator,
        )
        .await;

        output.journal.recording_complete = true;
        output.journal.end_time_utc = Some(end_time);
        output.journal.rate_stats = rate_stats.clone();
        output.journal.save(&active.dir)?;

        self.state = CaptureState::Uploading;
        let outcome = self
            .upload_and_finalize(active.session_id, active.grant, output.journal, active.dir)
            .await?;

        match &outcome {
            SessionOutcome::Completed { .. } => self.state = CaptureState::Done,
            SessionOutcome::QueuedOffline { .. } => self.state = CaptureState::Idle,
        }

        Ok(SessionOutcome::complete_with(outcome, rate_stats, analysis))
    }

    /// Process start: scan for orphaned sessions and resume or discard.
    ///
    /// Policy: journals older than `max_resume_age` (or unreadable) are
    /// discarded with a warning; younger ones re-create the session with
    /// the original client upload id, upload what is left and finalize.
    pub async fn resume_pending(&mut self) -> Result<Vec<ResumeOutcome>> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::InvalidState {
                state: self.state.as_str(),
                event: "resume",
            });
        }
        self.state = CaptureState::Resume;

        let root = self.config.sessions_root();
        let mut outcomes = Vec::new();

        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.state = CaptureState::Idle;
                return Ok(outcomes);
            }
            Err(e) => {
                self.state = CaptureState::Idle;
                return Err(e.into());
            }
        };

        for entry in entries.flatten() {
            let dir = entry.path();
            if !Journal::exists(&dir) {
                continue;
            }
            outcomes.push(self.resume_one(dir).await);
        }

        self.state = CaptureState::Idle;
        Ok(outcomes)
    }

    async fn resume_one(&self, dir: PathBuf) -> ResumeOutcome {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut journal = match Journal::load(&dir) {
            Ok(journal) => journal,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Discarding unreadable journal");
                let _ = std::fs::remove_dir_all(&dir);
                return ResumeOutcome::Discarded {
                    client_upload_id: dir_name,
                    reason: format!("unreadable journal: {}", e),
                };
            }
        };
        let client_upload_id = journal.create_request.client_upload_id.clone();

        if journal.age() > self.config.max_resume_age {
            warn!(
                client_upload_id = %client_upload_id,
                age_hours = journal.age().num_hours(),
                "Discarding stale capture session"
            );
            let _ = std::fs::remove_dir_all(&dir);
            return ResumeOutcome::Discarded {
                client_upload_id,
                reason: "older than max resume age".to_string(),
            };
        }

        // Re-attach: same client upload id, so the server returns the
        // original session and a fresh capability grant
        let (response, already_exists) =
            match self.client.create_session(&journal.create_request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(client_upload_id = %client_upload_id, error = %e, "Resume deferred");
                    return ResumeOutcome::StillQueued {
                        pending_chunks: journal
                            .pending()
                            .into_iter()
                            .map(|c| c.filename)
                            .collect(),
                        client_upload_id,
                    };
                }
            };
        debug!(
            client_upload_id = %client_upload_id,
            session_id = response.session_id,
            already_exists,
            "Reattached capture session"
        );
        journal.session_id = Some(response.session_id);

        // A session that crashed mid-recording has no stats or end time;
        // recover both from the chunk files themselves.
        if !journal.recording_complete {
            let (timestamps, sequences) = scan_chunks(&dir, &journal).await;
            journal.rate_stats = compute_rate_stats(&timestamps, &sequences);
            journal.end_time_utc = derived_end_time(&journal, &timestamps);
            journal.recording_complete = true;
            if let Err(e) = journal.save(&dir) {
                warn!(error = %e, "Failed to persist recovered journal");
            }
        }

        match self
            .upload_and_finalize(response.session_id, response.capability, journal, dir)
            .await
        {
            Ok(SessionOutcome::Completed { response, .. }) => ResumeOutcome::Finalized {
                client_upload_id,
                response,
            },
            Ok(SessionOutcome::QueuedOffline { pending_chunks, .. }) => {
                ResumeOutcome::StillQueued {
                    client_upload_id,
                    pending_chunks,
                }
            }
            Err(e) => {
                warn!(client_upload_id = %client_upload_id, error = %e, "Resume failed, keeping journal");
                ResumeOutcome::StillQueued {
                    client_upload_id,
                    pending_chunks: Vec::new(),
                }
            }
        }
    }

    /// Upload pending chunks (re-requesting an expired grant once) and
    /// finalize when everything is stored.
    async fn upload_and_finalize(
        &self,
        session_id: i64,
        grant: CapabilityGrant,
        mut journal: Journal,
        dir: PathBuf,
    ) -> Result<SessionOutcome> {
        let uploader = Uploader::new(
            self.client.clone(),
            self.config.retry.clone(),
            self.config.upload_concurrency,
        );
        let cancel = CancellationToken::new();

        let mut grant = grant;
        let mut report = uploader
            .upload_pending(&grant, &mut journal, &dir, &cancel)
            .await?;

        // An expired grant is a normal condition: re-request via the
        // idempotent create and run one more pass.
        if !report.all_uploaded() && grant.is_expired() {
            info!(session_id, "Capability grant expired mid-upload, re-requesting");
            let (response, _) = self.client.create_session(&journal.create_request).await?;
            grant = response.capability;
            report = uploader
                .upload_pending(&grant, &mut journal, &dir, &cancel)
                .await?;
        }

        if !report.all_uploaded() {
            warn!(
                session_id,
                queued = report.queued.len(),
                "Uploads incomplete, queueing session for later"
            );
            return Ok(SessionOutcome::QueuedOffline {
                client_upload_id: journal.create_request.client_upload_id.clone(),
                pending_chunks: report.queued,
            });
        }

        let end_time = journal.end_time_utc.unwrap_or_else(Utc::now);
        let request = build_finalize_request(&journal, end_time);

        match self.client.finalize(session_id, &request).await {
            Ok(response) => {
                info!(
                    session_id,
                    total_files = response.total_files,
                    total_bytes = response.total_bytes,
                    "Session finalized"
                );
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    warn!(error = %e, "Failed to clean up session directory");
                }
                Ok(SessionOutcome::Completed {
                    response,
                    rate_stats: journal.rate_stats.clone(),
                    analysis: None,
                })
            }
            Err(e) if e.is_retryable() => {
                warn!(session_id, error = %e, "Finalize deferred, queueing session");
                Ok(SessionOutcome::QueuedOffline {
                    client_upload_id: journal.create_request.client_upload_id.clone(),
                    pending_chunks: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

impl SessionOutcome {
    /// Attach stats/analysis computed by the live end-of-session path
    fn complete_with(
        self,
        rate_stats: Option<RateStats>,
        analysis: Option<SessionAnalysis>,
    ) -> Self {
        match self {
            Self::Completed { response, .. } => Self::Completed {
                response,
                rate_stats,
                analysis,
            },
            queued => queued,
        }
    }
}

// =============================================================================
// Sampler and collector
// =============================================================================

/// Runs on a dedicated blocking thread: pull from the source, hand off to
/// the collector. Nothing else happens here - no disk, no network.
fn sampler_loop(
    mut source: impl SampleSource,
    tx: mpsc::Sender<InertialSample>,
    stop: CancellationToken,
) -> Result<()> {
    loop {
        if stop.is_cancelled() {
            return Ok(());
        }
        match source.next_sample() {
            Ok(Some(sample)) => {
                if tx.blocking_send(sample).is_err() {
                    // Collector gone; session is shutting down
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// Single owner of the buffer, rotation and journal during recording.
async fn collect(
    mut rx: mpsc::Receiver<InertialSample>,
    dir: PathBuf,
    meta: ChunkMeta,
    mut journal: Journal,
    buffer_limit: usize,
) -> CollectorOutput {
    let mut buffer: Vec<InertialSample> = Vec::with_capacity(buffer_limit.min(16_384));
    let mut timestamps = Vec::new();
    let mut sequences = Vec::new();
    let mut next_index = 0u32;
    let mut failures = 0u32;

    while let Some(sample) = rx.recv().await {
        timestamps.push(sample.timestamp_ns);
        sequences.push(sample.sequence);
        buffer.push(sample);

        if buffer.len() >= buffer_limit {
            rotate(
                &dir,
                &meta,
                &mut next_index,
                &mut buffer,
                &mut journal,
                &mut failures,
            )
            .await;
        }
    }

    // Final flush of the partial chunk
    if !buffer.is_empty() {
        rotate(
            &dir,
            &meta,
            &mut next_index,
            &mut buffer,
            &mut journal,
            &mut failures,
        )
        .await;
    }

    CollectorOutput {
        journal,
        timestamps,
        sequences,
        chunk_write_failures: failures,
    }
}

/// Serialize the buffer into the next immutable chunk. Disk failure
/// abandons the chunk and is logged; it never propagates to sampling.
async fn rotate(
    dir: &PathBuf,
    meta: &ChunkMeta,
    next_index: &mut u32,
    buffer: &mut Vec<InertialSample>,
    journal: &mut Journal,
    failures: &mut u32,
) {
    let samples = std::mem::take(buffer);
    let index = *next_index;
    *next_index += 1;

    let write_dir = dir.clone();
    let write_meta = meta.clone();
    let written = tokio::task::spawn_blocking(move || {
        chunk::write_chunk(&write_dir, &write_meta, index, &samples)
    })
    .await;

    match written {
        Ok(Ok(file)) => {
            journal.chunks.push(ChunkEntry {
                filename: file.filename,
                bytes_size: file.bytes_size,
                sha256_hex: file.sha256_hex,
                num_samples: file.num_samples,
                state: ChunkState::Pending,
            });
            if let Err(e) = journal.save(dir) {
                warn!(error = %e, "Failed to persist journal after rotation");
            }
        }
        Ok(Err(e)) => {
            *failures += 1;
            warn!(index, error = %e, "Chunk write failed, abandoning chunk");
        }
        Err(e) => {
            *failures += 1;
            warn!(index, error = %e, "Chunk write task failed, abandoning chunk");
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Read samples back from disk and run the motion pipeline on a worker
async fn run_analysis(
    dir: &PathBuf,
    journal: &Journal,
    segmentation: &SegmentationConfig,
    integrator: &IntegratorConfig,
) -> Option<SessionAnalysis> {
    let paths = journal.chunk_paths(dir);
    if paths.is_empty() {
        return None;
    }
    let segmentation = segmentation.clone();
    let integrator = integrator.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut samples = Vec::new();
        for path in &paths {
            match chunk::read_chunk(path) {
                Ok((_, mut chunk_samples)) => samples.append(&mut chunk_samples),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping analysis, chunk unreadable");
                    return None;
                }
            }
        }
        if samples.is_empty() {
            return None;
        }
        Some(analyze(&samples, &segmentation, &integrator))
    })
    .await;

    result.ok().flatten()
}

/// Re-read chunk files to recover timestamps/sequences for a session that
/// crashed before its stats were computed
async fn scan_chunks(dir: &PathBuf, journal: &Journal) -> (Vec<i64>, Vec<i64>) {
    let paths = journal.chunk_paths(dir);
    let result = tokio::task::spawn_blocking(move || {
        let mut timestamps = Vec::new();
        let mut sequences = Vec::new();
        for path in &paths {
            match chunk::read_chunk(path) {
                Ok((_, samples)) => {
                    for sample in samples {
                        timestamps.push(sample.timestamp_ns);
                        sequences.push(sample.sequence);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable chunk");
                }
            }
        }
        (timestamps, sequences)
    })
    .await;

    result.unwrap_or_default()
}

/// End time for a crashed session: session start plus the recorded span
fn derived_end_time(journal: &Journal, timestamps: &[i64]) -> Option<DateTime<Utc>> {
    let first = timestamps.iter().min()?;
    let last = timestamps.iter().max()?;
    let span = ChronoDuration::nanoseconds(last - first);
    Some(journal.create_request.start_time_utc + span)
}

/// Manifest from the journal: every chunk, uploaded or not, is claimed
fn build_finalize_request(journal: &Journal, end_time: DateTime<Utc>) -> FinalizeRequest {
    let files = journal
        .chunks
        .iter()
        .map(|entry| ManifestFile {
            filename: entry.filename.clone(),
            purpose: FilePurpose::Raw,
            bytes_size: entry.bytes_size,
            sha256_hex: Some(entry.sha256_hex.clone()),
            num_samples: Some(entry.num_samples),
            content_type: Some(CHUNK_CONTENT_TYPE.to_string()),
        })
        .collect();

    FinalizeRequest {
        end_time_utc: end_time,
        files,
        rate_stats: journal.rate_stats.clone(),
    }
}
