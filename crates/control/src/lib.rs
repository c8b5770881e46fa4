//! Suburi Control
//!
//! Relational catalog for the ingestion service, backed by Turso (async
//! SQLite-compatible).
//!
//! # Architecture
//!
//! [`Catalog`] owns the database and hands out borrowed repositories:
//!
//! - [`DeviceRepo`] - device rows, upserted per (user, hw_id)
//! - [`SessionRepo`] - capture sessions and the create/finalize lifecycle
//! - [`FileRepo`] - per-session registered files
//! - [`StatsRepo`] - optional rate-stats rows, at most one per session
//! - [`UploadLedger`] - the client-upload idempotency ledger
//!
//! Concurrency safety for retried creates and finalizes comes from UNIQUE
//! constraints, not application-level locking; reads never block writes.

mod db;
mod error;
pub mod repos;

#[cfg(test)]
mod catalog_test;

pub use db::Catalog;
pub use error::{ControlError, Result};
pub use repos::devices::DeviceRepo;
pub use repos::files::{FileRepo, FileTotals, NewSessionFile};
pub use repos::sessions::SessionRepo;
pub use repos::stats::StatsRepo;
pub use repos::uploads::UploadLedger;
