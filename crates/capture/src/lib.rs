//! Suburi Capture
//!
//! Client-side capture lifecycle: couples the motion pipeline to an
//! external activity session, buffers high-rate samples, rotates them into
//! immutable chunk files, computes rate-quality statistics and drives
//! upload + finalize against the ingestion service.
//!
//! # Architecture
//!
//! ```text
//! [SampleSource] → sampler thread → channel → collector task
//!                                                  ↓ (rotation at buffer limit)
//!                                             chunk files + journal
//!                                                  ↓ (session end)
//!                        rate stats + analysis → uploader (bounded, retried) → finalize
//! ```
//!
//! The sampling path never touches disk or network: a dedicated thread
//! pulls from the source and hands samples to the collector task over a
//! channel. Rotation, analysis and uploads all happen off that path.
//!
//! Crash recovery is a durable work queue: every rotation appends to a
//! journal file, and [`CaptureController::resume_pending`] re-attaches
//! orphaned sessions by re-creating them with the original client upload
//! id (idempotent on the server) before uploading whatever is left.
//!
//! # States
//!
//! `Idle → Recording → Finalizing → Uploading → Done`, with `Resume`
//! reachable only at process start when unflushed chunks are found.

pub mod analysis;
pub mod chunk;
pub mod client;
pub mod controller;
pub mod error;
pub mod journal;
pub mod source;
pub mod stats;
pub mod uploader;

#[cfg(test)]
mod stats_test;

pub use analysis::{SessionAnalysis, analyze};
pub use chunk::{ChunkFile, chunk_filename, read_chunk, write_chunk};
pub use client::IngestClient;
pub use controller::{
    CaptureConfig, CaptureController, CaptureState, ResumeOutcome, SessionOutcome, SessionParams,
};
pub use error::{CaptureError, Result};
pub use journal::{ChunkEntry, ChunkState, Journal};
pub use source::{ReplaySource, SampleSource};
pub use stats::compute_rate_stats;
pub use uploader::{RetryPolicy, UploadReport, Uploader};
