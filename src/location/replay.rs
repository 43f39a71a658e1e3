use crate::geo::LocationSample;
use crate::location::provider::{LocationProvider, PermissionStatus, SamplingPolicy};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Plays back a recorded track, sleeping for the recorded gaps between
/// samples divided by `speed`.
pub struct ReplayProvider {
    pending: VecDeque<LocationSample>,
    policy: SamplingPolicy,
    speed: f64,
    last_delivered: Option<LocationSample>,
    permission: PermissionStatus,
}

impl ReplayProvider {
    pub fn new(track: Vec<LocationSample>, policy: SamplingPolicy, speed: f64) -> Self {
        Self {
            pending: track.into(),
            policy,
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
            last_delivered: None,
            permission: PermissionStatus::Granted,
        }
    }

    /// Answer permission requests with `status` instead of granting.
    pub fn with_permission(mut self, status: PermissionStatus) -> Self {
        self.permission = status;
        self
    }

    fn gap_to(&self, next: &LocationSample) -> Duration {
        self.last_delivered
            .and_then(|last| (next.timestamp - last.timestamp).to_std().ok())
            .map(|gap| gap.div_f64(self.speed))
            .unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl LocationProvider for ReplayProvider {
    async fn request_permission(&mut self) -> PermissionStatus {
        self.permission
    }

    async fn next_sample(&mut self) -> Option<LocationSample> {
        if self.permission == PermissionStatus::Denied {
            return None;
        }

        while let Some(next) = self.pending.pop_front() {
            if !self.policy.admits(self.last_delivered.as_ref(), &next) {
                debug!(timestamp = %next.timestamp, "sample below sampling policy, skipped");
                continue;
            }

            let gap = self.gap_to(&next);
            if !gap.is_zero() {
                tokio::time::sleep(gap).await;
            }
            self.last_delivered = Some(next);
            return Some(next);
        }
        None
    }
}
