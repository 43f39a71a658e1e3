use crate::geo::LocationSample;
use crate::location::provider::{LocationProvider, PermissionStatus, SamplingPolicy};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 64;

/// Provider fed by the host platform through an mpsc sender. Samples with
/// invalid coordinates are dropped before they reach the pipeline.
pub struct ChannelProvider {
    rx: mpsc::Receiver<LocationSample>,
    policy: Option<SamplingPolicy>,
    last_delivered: Option<LocationSample>,
    permission: PermissionStatus,
}

impl ChannelProvider {
    pub fn new(permission: PermissionStatus) -> (mpsc::Sender<LocationSample>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let provider = Self {
            rx,
            policy: None,
            last_delivered: None,
            permission,
        };
        (tx, provider)
    }

    /// Filter incoming samples through `policy` before delivering them.
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

#[async_trait]
impl LocationProvider for ChannelProvider {
    async fn request_permission(&mut self) -> PermissionStatus {
        self.permission
    }

    async fn next_sample(&mut self) -> Option<LocationSample> {
        if self.permission == PermissionStatus::Denied {
            return None;
        }
        loop {
            let sample = self.rx.recv().await?;
            if !sample.is_valid() {
                warn!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    "host sent an invalid location sample, dropped"
                );
                continue;
            }
            let admitted = self
                .policy
                .map_or(true, |p| p.admits(self.last_delivered.as_ref(), &sample));
            if admitted {
                self.last_delivered = Some(sample);
                return Some(sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(lat: f64, ms: i64) -> LocationSample {
        LocationSample::new(
            lat,
            0.0,
            Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap(),
        )
    }

    #[tokio::test]
    async fn policy_filters_noise_between_admitted_samples() {
        let (tx, provider) = ChannelProvider::new(PermissionStatus::Granted);
        let mut provider = provider.with_policy(SamplingPolicy::default());

        tx.send(sample(0.0, 0)).await.unwrap();
        // stationary and too soon
        tx.send(sample(0.0, 500)).await.unwrap();
        // interval elapsed
        tx.send(sample(0.0, 2_000)).await.unwrap();
        drop(tx);

        let first = provider.next_sample().await.unwrap();
        let second = provider.next_sample().await.unwrap();
        assert_eq!((second.timestamp - first.timestamp).num_milliseconds(), 2_000);
        assert!(provider.next_sample().await.is_none());
    }

    #[tokio::test]
    async fn without_policy_every_valid_sample_is_delivered() {
        let (tx, mut provider) = ChannelProvider::new(PermissionStatus::Granted);
        tx.send(sample(0.0, 0)).await.unwrap();
        tx.send(sample(0.0, 500)).await.unwrap();
        drop(tx);

        assert!(provider.next_sample().await.is_some());
        assert!(provider.next_sample().await.is_some());
        assert!(provider.next_sample().await.is_none());
    }

    #[tokio::test]
    async fn invalid_coordinates_are_dropped() {
        let (tx, mut provider) = ChannelProvider::new(PermissionStatus::Granted);
        tx.send(sample(f64::NAN, 0)).await.unwrap();
        tx.send(sample(1.0, 100)).await.unwrap();
        drop(tx);

        assert_eq!(provider.next_sample().await.map(|s| s.latitude), Some(1.0));
        assert!(provider.next_sample().await.is_none());
    }
}
