use crate::geo::{RoutePlan, RouteStop};
use crate::tracking::proximity::{distance_to_stop, STOP_ALARM_RADIUS_METERS};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmState {
    pub visible: bool,
    pub next_stop: Option<RouteStop>,
    pub distance_to_next_stop: f64,
}

/// Emitted once per idle -> triggered transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmTrigger {
    pub stop: RouteStop,
    pub distance: f64,
}

/// Watches the distance to the plan's next stop and raises the stop alarm.
///
/// Stops are identified by their position in the plan. A dismissed position
/// stays disarmed until the plan cursor moves, so lingering near a stop after
/// dismissing does not re-alarm while a repeated stop later in the plan does.
#[derive(Debug)]
pub struct StopProximityEvaluator {
    threshold_meters: f64,
    state: AlarmState,
    visible_index: Option<usize>,
    disarmed_index: Option<usize>,
}

impl Default for StopProximityEvaluator {
    fn default() -> Self {
        Self::new(STOP_ALARM_RADIUS_METERS)
    }
}

impl StopProximityEvaluator {
    pub fn new(threshold_meters: f64) -> Self {
        Self {
            threshold_meters,
            state: AlarmState::default(),
            visible_index: None,
            disarmed_index: None,
        }
    }

    pub fn threshold_meters(&self) -> f64 {
        self.threshold_meters
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn evaluate_plan(
        &mut self,
        latitude: f64,
        longitude: f64,
        plan: &RoutePlan,
    ) -> Option<AlarmTrigger> {
        let next = plan.next_stop().map(|stop| (plan.visited_count(), stop));
        self.evaluate(latitude, longitude, next)
    }

    /// Recompute the distance to the stop at plan position `next.0`. Returns a
    /// trigger only on the transition into the visible state. Non-finite
    /// positions are ignored.
    pub fn evaluate(
        &mut self,
        latitude: f64,
        longitude: f64,
        next: Option<(usize, &RouteStop)>,
    ) -> Option<AlarmTrigger> {
        if !latitude.is_finite() || !longitude.is_finite() {
            debug!(latitude, longitude, "non-finite position ignored");
            return None;
        }

        if self.state.visible {
            if let Some(stop) = &self.state.next_stop {
                self.state.distance_to_next_stop = distance_to_stop(latitude, longitude, stop);
            }
            return None;
        }

        let (index, stop) = next?;
        let distance = distance_to_stop(latitude, longitude, stop);
        if !distance.is_finite() {
            return None;
        }
        self.state.distance_to_next_stop = distance;

        if self.disarmed_index.is_some_and(|d| d != index) {
            debug!(stop = %stop.location_name, index, "next stop changed, alarm re-armed");
            self.disarmed_index = None;
        }

        if distance > self.threshold_meters || self.disarmed_index.is_some() {
            return None;
        }

        info!(
            stop = %stop.location_name,
            index,
            distance_m = distance.round(),
            "stop alarm triggered"
        );
        self.state.visible = true;
        self.state.next_stop = Some(stop.clone());
        self.visible_index = Some(index);
        Some(AlarmTrigger {
            stop: stop.clone(),
            distance,
        })
    }

    /// User dismissed the alarm. Does not advance the route plan.
    pub fn dismiss(&mut self) {
        if !self.state.visible {
            return;
        }
        self.disarmed_index = self.visible_index.take();
        self.state.visible = false;
        if let Some(stop) = self.state.next_stop.take() {
            info!(stop = %stop.location_name, "stop alarm dismissed");
        }
    }

    /// Drop all alarm state, e.g. when tracking stops.
    pub fn reset(&mut self) {
        self.state = AlarmState::default();
        self.visible_index = None;
        self.disarmed_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // meters per degree of latitude
    const M_PER_DEG: f64 = 111_194.93;

    fn stop(name: &str) -> RouteStop {
        RouteStop {
            location_name: name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            note: None,
        }
    }

    fn lat_at(meters: f64) -> f64 {
        meters / M_PER_DEG
    }

    #[test]
    fn does_not_trigger_outside_threshold() {
        let mut eval = StopProximityEvaluator::new(50.0);
        let s = stop("Harbor");
        assert!(eval.evaluate(lat_at(60.0), 0.0, Some((0, &s))).is_none());
        assert!(!eval.state().visible);
        assert!((eval.state().distance_to_next_stop - 60.0).abs() < 0.1);
    }

    #[test]
    fn triggers_once_and_updates_distance_while_visible() {
        let mut eval = StopProximityEvaluator::new(50.0);
        let s = stop("Harbor");

        let trigger = eval.evaluate(lat_at(40.0), 0.0, Some((0, &s))).unwrap();
        assert_eq!(trigger.stop, s);
        assert!((trigger.distance - 40.0).abs() < 0.1);
        assert!(eval.state().visible);

        assert!(eval.evaluate(lat_at(30.0), 0.0, Some((0, &s))).is_none());
        assert!(eval.state().visible);
        assert!((eval.state().distance_to_next_stop - 30.0).abs() < 0.1);
    }

    #[test]
    fn dismissed_stop_does_not_retrigger_until_stop_changes() {
        let mut eval = StopProximityEvaluator::new(50.0);
        let first = stop("Harbor");
        eval.evaluate(lat_at(40.0), 0.0, Some((0, &first))).unwrap();
        eval.dismiss();
        assert!(!eval.state().visible);
        assert!(eval.state().next_stop.is_none());

        assert!(eval.evaluate(lat_at(10.0), 0.0, Some((0, &first))).is_none());
        assert!(!eval.state().visible);

        let second = stop("Lighthouse");
        assert!(eval.evaluate(lat_at(10.0), 0.0, Some((1, &second))).is_some());
    }

    #[test]
    fn no_next_stop_is_a_noop() {
        let mut eval = StopProximityEvaluator::default();
        assert!(eval.evaluate(0.0, 0.0, None).is_none());
        assert_eq!(eval.state(), &AlarmState::default());
    }

    #[test]
    fn follows_route_plan_cursor() {
        let mut plan = RoutePlan::new(vec![
            RouteStop {
                latitude: 1.0,
                ..stop("Far")
            },
            stop("Here"),
        ]);
        let mut eval = StopProximityEvaluator::default();
        assert!(eval.evaluate_plan(0.0, 0.0, &plan).is_none());

        plan.advance();
        let trigger = eval.evaluate_plan(0.0, 0.0, &plan).unwrap();
        assert_eq!(trigger.stop.location_name, "Here");
    }

    #[test]
    fn identical_stop_later_in_plan_rearms() {
        let mut plan = RoutePlan::new(vec![stop("Hotel"), stop("Hotel")]);
        let mut eval = StopProximityEvaluator::default();

        assert!(eval.evaluate_plan(lat_at(10.0), 0.0, &plan).is_some());
        eval.dismiss();
        assert!(eval.evaluate_plan(lat_at(10.0), 0.0, &plan).is_none());

        plan.advance();
        let trigger = eval.evaluate_plan(lat_at(10.0), 0.0, &plan).unwrap();
        assert_eq!(trigger.stop.location_name, "Hotel");
    }

    #[test]
    fn nan_position_never_triggers() {
        let far = RouteStop {
            latitude: 10.0,
            ..stop("Far")
        };
        let mut eval = StopProximityEvaluator::default();
        assert!(eval.evaluate(f64::NAN, 0.0, Some((0, &far))).is_none());
        assert!(eval.evaluate(0.0, f64::INFINITY, Some((0, &far))).is_none());
        assert!(!eval.state().visible);
        assert_eq!(eval.state().distance_to_next_stop, 0.0);
    }

    #[test]
    fn nan_position_while_visible_keeps_last_distance() {
        let s = stop("Harbor");
        let mut eval = StopProximityEvaluator::default();
        eval.evaluate(lat_at(20.0), 0.0, Some((0, &s))).unwrap();
        assert!(eval.evaluate(f64::NAN, 0.0, Some((0, &s))).is_none());
        assert!((eval.state().distance_to_next_stop - 20.0).abs() < 0.1);
    }
}
