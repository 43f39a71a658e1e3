use crate::geo::LocationSample;
use crate::tracking::proximity::sample_distance;
use tokio::sync::watch;
use tracing::debug;

/// Running great-circle distance over a stream of location samples.
///
/// `total_meters` only grows while tracking; `reset` is the only way back to 0.
/// The current total is also published on a watch channel.
#[derive(Debug)]
pub struct DistanceAccumulator {
    total_meters: f64,
    last_sample: Option<LocationSample>,
    total_tx: watch::Sender<f64>,
}

impl Default for DistanceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        let (total_tx, _) = watch::channel(0.0);
        Self {
            total_meters: 0.0,
            last_sample: None,
            total_tx,
        }
    }

    /// Feed one sample. Returns the distance added by it (0 for the baseline).
    /// Samples with non-finite or out-of-range coordinates are dropped.
    pub fn record(&mut self, sample: LocationSample) -> f64 {
        if !sample.is_valid() {
            debug!(
                latitude = sample.latitude,
                longitude = sample.longitude,
                "invalid sample dropped"
            );
            return 0.0;
        }

        let delta = match &self.last_sample {
            Some(prev) => sample_distance(prev, &sample),
            None => 0.0,
        };

        self.last_sample = Some(sample);
        if delta > 0.0 {
            self.total_meters += delta;
            self.total_tx.send_replace(self.total_meters);
        }
        delta
    }

    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    pub fn last_sample(&self) -> Option<&LocationSample> {
        self.last_sample.as_ref()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.total_tx.subscribe()
    }

    /// Forget the baseline and zero the total (tracking stopped).
    pub fn reset(&mut self) {
        self.total_meters = 0.0;
        self.last_sample = None;
        self.total_tx.send_replace(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::proximity::haversine_distance;
    use chrono::{TimeZone, Utc};

    fn sample(lat: f64, lon: f64, secs: i64) -> LocationSample {
        LocationSample::new(lat, lon, Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    #[test]
    fn first_sample_is_baseline() {
        let mut acc = DistanceAccumulator::new();
        assert_eq!(acc.record(sample(45.0, 7.0, 0)), 0.0);
        assert_eq!(acc.total_meters(), 0.0);
        assert!(acc.last_sample().is_some());
    }

    #[test]
    fn adds_exact_haversine_between_consecutive_samples() {
        let mut acc = DistanceAccumulator::new();
        acc.record(sample(45.0, 7.0, 0));
        acc.record(sample(45.001, 7.0, 2));
        acc.record(sample(45.001, 7.001, 4));

        let expected = haversine_distance(45.0, 7.0, 45.001, 7.0)
            + haversine_distance(45.001, 7.0, 45.001, 7.001);
        assert!((acc.total_meters() - expected).abs() < 1e-9);
    }

    #[test]
    fn total_is_published_and_reset() {
        let mut acc = DistanceAccumulator::new();
        let rx = acc.subscribe();
        acc.record(sample(45.0, 7.0, 0));
        acc.record(sample(45.001, 7.0, 2));
        assert!(*rx.borrow() > 100.0);

        acc.reset();
        assert_eq!(*rx.borrow(), 0.0);
        assert!(acc.last_sample().is_none());
        // next sample is a fresh baseline
        assert_eq!(acc.record(sample(10.0, 10.0, 10)), 0.0);
    }

    #[test]
    fn invalid_sample_neither_adds_nor_replaces_baseline() {
        let mut acc = DistanceAccumulator::new();
        acc.record(sample(45.0, 7.0, 0));
        assert_eq!(acc.record(sample(f64::NAN, 7.0, 1)), 0.0);
        assert_eq!(acc.total_meters(), 0.0);
        assert_eq!(acc.last_sample().map(|s| s.latitude), Some(45.0));

        acc.record(sample(45.001, 7.0, 2));
        let expected = haversine_distance(45.0, 7.0, 45.001, 7.0);
        assert!((acc.total_meters() - expected).abs() < 1e-9);
    }
}
