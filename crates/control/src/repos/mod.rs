//! Catalog repositories
//!
//! One repository per aggregate. All repositories borrow the database and
//! open a connection per call; Turso connections are cheap handles.

pub mod devices;
pub mod files;
pub mod sessions;
pub mod stats;
pub mod uploads;

pub(crate) mod row;
