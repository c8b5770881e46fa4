//! Suburi Kinematic Integration
//!
//! Integrates gravity-removed acceleration into velocity and position, using
//! ZUPT periods from the segmentation engine as zero-velocity anchors to
//! bound drift.
//!
//! # Design
//!
//! - Per-sample Δt from actual timestamps - capture rate is a request, not
//!   a guarantee, so uniform spacing is never assumed.
//! - Trapezoidal integration by default; first-order rectangular is a
//!   configurable fallback behind the same contract.
//! - All internal math in `f64` regardless of the `f32` sample storage,
//!   so rounding error does not compound over thousands of steps.
//! - [`integrate_swing`] integrates one segment in isolation with fresh
//!   zero initial conditions - short strikes come out materially more
//!   accurate because drift from unrelated parts of the session never
//!   enters the segment.

mod integrator;


pub use integrator::{integrate, integrate_swing, Integration, IntegrationMethod, IntegratorConfig};
