use crate::geo::{LocationSample, RoutePlan, RouteStop};
use crate::location::{LocationProvider, PermissionStatus};
use crate::notify::{AlarmModal, AlarmPresenter};
use crate::tracking::alarm::{AlarmState, StopProximityEvaluator};
use crate::tracking::distance::DistanceAccumulator;
use crate::tracking::timer::RouteTimer;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

const TIMER_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub active: bool,
    pub permission: Option<PermissionStatus>,
    pub distance_m: f64,
    pub elapsed_secs: u64,
    pub position: Option<LocationSample>,
    pub next_stop: Option<RouteStop>,
    pub stops_remaining: usize,
    pub alarm: AlarmState,
    pub modal: Option<AlarmModal>,
}

/// Totals at the moment the session stopped, before they were reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSummary {
    pub distance_m: f64,
    pub elapsed_secs: u64,
}

/// Shared access to a running session for the status API.
#[derive(Clone)]
pub struct TrackingHandle {
    snapshot: Arc<RwLock<TrackingSnapshot>>,
    evaluator: Arc<RwLock<StopProximityEvaluator>>,
    plan: Arc<RwLock<RoutePlan>>,
}

impl TrackingHandle {
    pub async fn snapshot(&self) -> TrackingSnapshot {
        self.snapshot.read().await.clone()
    }

    /// The modal's dismiss action.
    pub async fn dismiss_alarm(&self) -> AlarmState {
        let mut evaluator = self.evaluator.write().await;
        evaluator.dismiss();
        let alarm = evaluator.state().clone();

        let mut snapshot = self.snapshot.write().await;
        snapshot.modal = AlarmModal::from_state(&alarm);
        snapshot.alarm = alarm.clone();
        alarm
    }

    /// Mark the current stop visited and move to the next one.
    pub async fn advance_route(&self) -> Option<RouteStop> {
        let mut plan = self.plan.write().await;
        let next = plan.advance().cloned();
        match &next {
            Some(stop) => info!(stop = %stop.location_name, "route advanced"),
            None => info!("route finished"),
        }

        let mut snapshot = self.snapshot.write().await;
        snapshot.next_stop = next.clone();
        snapshot.stops_remaining = plan.upcoming().len();
        next
    }
}

struct Pipeline {
    accumulator: DistanceAccumulator,
    timer: RouteTimer,
    presenter: AlarmPresenter,
    handle: TrackingHandle,
}

impl Pipeline {
    /// Snapshot writes happen while the plan and evaluator locks are held, so
    /// a concurrent dismiss or route advance cannot be overwritten by stale
    /// values. The notification goes out after the snapshot is published.
    async fn on_sample(&mut self, sample: LocationSample) {
        self.accumulator.record(sample);

        let trigger = {
            let plan = self.handle.plan.read().await;
            let mut evaluator = self.handle.evaluator.write().await;
            let trigger = evaluator.evaluate_plan(sample.latitude, sample.longitude, &plan);
            let alarm = evaluator.state().clone();

            let mut snapshot = self.handle.snapshot.write().await;
            snapshot.position = Some(sample);
            snapshot.distance_m = self.accumulator.total_meters();
            snapshot.next_stop = plan.next_stop().cloned();
            snapshot.stops_remaining = plan.upcoming().len();
            snapshot.modal = AlarmModal::from_state(&alarm);
            snapshot.alarm = alarm;
            trigger
        };

        if let Some(trigger) = trigger {
            self.presenter.spawn_trigger(trigger);
        }
    }

    async fn on_tick(&self) {
        self.handle.snapshot.write().await.elapsed_secs = self.timer.elapsed_secs();
    }
}

/// Owns one tracking run: location samples feed the distance accumulator and
/// the stop evaluator while the route timer counts up.
pub struct TrackingSession<P> {
    provider: P,
    pipeline: Pipeline,
}

impl<P: LocationProvider> TrackingSession<P> {
    pub fn new(
        provider: P,
        plan: RoutePlan,
        evaluator: StopProximityEvaluator,
        presenter: AlarmPresenter,
    ) -> Self {
        let snapshot = TrackingSnapshot {
            next_stop: plan.next_stop().cloned(),
            stops_remaining: plan.upcoming().len(),
            ..Default::default()
        };
        let handle = TrackingHandle {
            snapshot: Arc::new(RwLock::new(snapshot)),
            evaluator: Arc::new(RwLock::new(evaluator)),
            plan: Arc::new(RwLock::new(plan)),
        };
        Self {
            provider,
            pipeline: Pipeline {
                accumulator: DistanceAccumulator::new(),
                timer: RouteTimer::new(),
                presenter,
                handle,
            },
        }
    }

    pub fn handle(&self) -> TrackingHandle {
        self.pipeline.handle.clone()
    }

    pub fn distance_updates(&self) -> watch::Receiver<f64> {
        self.pipeline.accumulator.subscribe()
    }

    /// Track until `shutdown` resolves. Location samples stop being read if
    /// permission is denied or the provider runs dry; the timer keeps going.
    pub async fn run<F>(self, shutdown: F) -> TrackingSummary
    where
        F: Future<Output = ()>,
    {
        let TrackingSession {
            mut provider,
            mut pipeline,
        } = self;

        let permission = provider.request_permission().await;
        let mut sampling = permission == PermissionStatus::Granted;
        if !sampling {
            warn!("foreground location permission denied, distance tracking stays inert");
        }

        pipeline.timer.set_active(true);
        {
            let mut snapshot = pipeline.handle.snapshot.write().await;
            snapshot.active = true;
            snapshot.permission = Some(permission);
        }
        info!(?permission, "tracking session started");

        let mut ticker = tokio::time::interval(TIMER_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => pipeline.on_tick().await,
                sample = provider.next_sample(), if sampling => match sample {
                    Some(sample) => pipeline.on_sample(sample).await,
                    None => {
                        info!("location source exhausted");
                        sampling = false;
                    }
                },
            }
        }

        let summary = TrackingSummary {
            distance_m: pipeline.accumulator.total_meters(),
            elapsed_secs: pipeline.timer.elapsed_secs(),
        };

        pipeline.timer.set_active(false);
        pipeline.accumulator.reset();
        pipeline.handle.evaluator.write().await.reset();
        {
            let mut snapshot = pipeline.handle.snapshot.write().await;
            snapshot.active = false;
            snapshot.distance_m = 0.0;
            snapshot.elapsed_secs = 0;
            snapshot.alarm = AlarmState::default();
            snapshot.modal = None;
        }

        info!(
            distance_m = summary.distance_m.round(),
            elapsed_secs = summary.elapsed_secs,
            "tracking session stopped"
        );
        summary
    }
}
