//! Suburi Model
//!
//! Canonical data types shared between the capture client and the ingestion
//! service:
//!
//! - [`sample`] - Raw inertial sensor readings
//! - [`events`] - Derived motion events (swings, stillness periods, kinematics)
//! - [`session`] - Server-catalogued sessions, devices, files and stats
//! - [`wire`] - JSON payloads for the ingestion protocol and chunk files
//!
//! This crate holds no I/O and no business logic; it exists so that the
//! client pipeline and the server speak exactly the same types.

mod error;

pub mod events;
pub mod sample;
pub mod session;
pub mod wire;


pub use error::{ModelError, Result};
pub use events::{KinematicsPoint, MotionSegment, ZuptPeriod};
pub use sample::{InertialSample, Quat, Vec3};
pub use session::{
    CaptureSession, ClientUploadRecord, CoordFrame, DeviceInfo, FilePurpose, Platform, RateStats,
    SessionFile,
};
pub use wire::{
    CapabilityGrant, ChunkMeta, CreateSessionRequest, CreateSessionResponse, FinalizeRequest,
    FinalizeResponse, ManifestFile, SessionDetail, SessionSummary, SCHEMA_VERSION,
};
