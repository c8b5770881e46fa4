//! Sample sources
//!
//! [`SampleSource`] abstracts the platform sensor. Implementations block
//! until the next reading at whatever cadence the hardware delivers - the
//! target rate is a request, and timestamps are recorded as delivered,
//! never resampled to force uniformity.

use std::time::Duration;

use suburi_model::InertialSample;

use crate::error::Result;

/// A blocking stream of inertial samples
///
/// Runs on a dedicated sampler thread, never on the async runtime.
pub trait SampleSource: Send + 'static {
    /// Block until the next sample. `Ok(None)` means the source ended;
    /// `Err(SensorUnavailable)` is fatal for the session.
    fn next_sample(&mut self) -> Result<Option<InertialSample>>;
}

/// Replays a pre-recorded sample sequence
///
/// With `pacing`, sleeps between samples to emulate a live sensor;
/// without, yields as fast as the consumer pulls. Used for simulation and
/// tests.
pub struct ReplaySource {
    samples: std::vec::IntoIter<InertialSample>,
    pacing: Option<Duration>,
}

impl ReplaySource {
    pub fn new(samples: Vec<InertialSample>) -> Self {
        Self {
            samples: samples.into_iter(),
            pacing: None,
        }
    }

    /// Sleep this long before each sample
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }
}

impl SampleSource for ReplaySource {
    fn next_sample(&mut self) -> Result<Option<InertialSample>> {
        let Some(sample) = self.samples.next() else {
            return Ok(None);
        };
        if let Some(interval) = self.pacing {
            std::thread::sleep(interval);
        }
        Ok(Some(sample))
    }
}
