use crate::geo::LocationSample;
use crate::tracking::proximity::sample_distance;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform source of device positions.
#[async_trait]
pub trait LocationProvider: Send {
    /// Ask for foreground location access. Called once per session.
    async fn request_permission(&mut self) -> PermissionStatus;

    /// Wait for the next admitted sample. `None` means the source is exhausted.
    async fn next_sample(&mut self) -> Option<LocationSample>;
}

/// Minimum spacing between delivered samples. A sample is admitted once
/// either the interval has passed or the device moved far enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    pub min_interval: Duration,
    pub min_displacement_m: f64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(2),
            min_displacement_m: 1.0,
        }
    }
}

impl SamplingPolicy {
    pub fn admits(&self, last: Option<&LocationSample>, next: &LocationSample) -> bool {
        let Some(last) = last else {
            return true;
        };

        let waited = (next.timestamp - last.timestamp)
            .to_std()
            .map(|d| d >= self.min_interval)
            .unwrap_or(false);

        waited || sample_distance(last, next) >= self.min_displacement_m
    }
}
