use tokio::time::Instant;

/// Whole-second stopwatch driven by an "active" flag. There is no pause:
/// deactivating forgets the elapsed time.
#[derive(Debug, Default, Clone)]
pub struct RouteTimer {
    started_at: Option<Instant>,
}

impl RouteTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&mut self, active: bool) {
        self.set_active_at(active, Instant::now());
    }

    /// Apply the flag as of `now`. Repeating the current state changes nothing.
    pub fn set_active_at(&mut self, active: bool, now: Instant) {
        match (active, self.started_at) {
            (true, None) => self.started_at = Some(now),
            (false, Some(_)) => self.started_at = None,
            _ => {}
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs_at(Instant::now())
    }

    pub fn elapsed_secs_at(&self, now: Instant) -> u64 {
        self.started_at
            .map(|start| now.saturating_duration_since(start).as_secs())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_whole_seconds_since_activation() {
        let t0 = Instant::now();
        let mut timer = RouteTimer::new();
        timer.set_active_at(true, t0);

        assert_eq!(timer.elapsed_secs_at(t0), 0);
        assert_eq!(timer.elapsed_secs_at(t0 + Duration::from_millis(2_999)), 2);
        assert_eq!(timer.elapsed_secs_at(t0 + Duration::from_secs(7)), 7);
    }

    #[test]
    fn deactivating_resets_and_reactivating_starts_from_zero() {
        let t0 = Instant::now();
        let mut timer = RouteTimer::new();
        timer.set_active_at(true, t0);
        timer.set_active_at(false, t0 + Duration::from_secs(30));
        assert!(!timer.is_active());
        assert_eq!(timer.elapsed_secs_at(t0 + Duration::from_secs(31)), 0);

        let t1 = t0 + Duration::from_secs(40);
        timer.set_active_at(true, t1);
        assert_eq!(timer.elapsed_secs_at(t1 + Duration::from_secs(3)), 3);
    }

    #[test]
    fn repeated_activation_keeps_original_start() {
        let t0 = Instant::now();
        let mut timer = RouteTimer::new();
        timer.set_active_at(true, t0);
        timer.set_active_at(true, t0 + Duration::from_secs(5));
        assert_eq!(timer.elapsed_secs_at(t0 + Duration::from_secs(6)), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_the_runtime_clock() {
        let mut timer = RouteTimer::new();
        timer.set_active(true);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(timer.elapsed_secs(), 4);
        timer.set_active(false);
        assert_eq!(timer.elapsed_secs(), 0);
    }
}
