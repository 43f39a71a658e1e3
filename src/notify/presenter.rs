use crate::notify::notification::{LocalNotification, NotificationData, Notifier, TravelMode};
use crate::tracking::{AlarmState, AlarmTrigger};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

const STOP_ALARM_KIND: &str = "stop_alarm";
const STOP_ALARM_SCREEN: &str = "route";
const VIBRATION_PATTERN: [u32; 4] = [0, 250, 250, 250];

/// What the blocking alarm modal shows. The only action is dismiss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmModal {
    pub stop_name: String,
    pub distance_m: u64,
}

impl AlarmModal {
    pub fn from_state(state: &AlarmState) -> Option<Self> {
        if !state.visible {
            return None;
        }
        let stop = state.next_stop.as_ref()?;
        Some(Self {
            stop_name: stop.location_name.clone(),
            distance_m: round_meters(state.distance_to_next_stop),
        })
    }
}

#[derive(Clone)]
pub struct AlarmPresenter {
    notifier: Arc<dyn Notifier>,
    travel_mode: TravelMode,
}

impl AlarmPresenter {
    pub fn new(notifier: Arc<dyn Notifier>, travel_mode: TravelMode) -> Self {
        Self {
            notifier,
            travel_mode,
        }
    }

    pub fn notification_for(&self, trigger: &AlarmTrigger) -> LocalNotification {
        let distance = round_meters(trigger.distance);
        let stop_name = trigger.stop.location_name.clone();
        LocalNotification {
            title: "Approaching your stop".to_string(),
            body: format!(
                "{} is {}m away ({}).",
                stop_name, distance, self.travel_mode
            ),
            sound: "default".to_string(),
            priority: "high".to_string(),
            vibration_pattern: VIBRATION_PATTERN.to_vec(),
            data: NotificationData {
                stop_name,
                distance,
                route_mode: self.travel_mode,
                kind: STOP_ALARM_KIND.to_string(),
                screen: STOP_ALARM_SCREEN.to_string(),
            },
        }
    }

    /// Dispatch on a separate task so a slow notifier cannot hold up the caller.
    pub fn spawn_trigger(&self, trigger: AlarmTrigger) -> JoinHandle<()> {
        let presenter = self.clone();
        tokio::spawn(async move { presenter.on_trigger(&trigger).await })
    }

    /// Fire the one notification for a fresh trigger. Failures are logged only.
    pub async fn on_trigger(&self, trigger: &AlarmTrigger) {
        let notification = self.notification_for(trigger);
        if let Err(e) = self.notifier.dispatch(&notification).await {
            warn!(stop = %trigger.stop.location_name, error = %e, "stop alarm notification failed");
        }
    }
}

fn round_meters(distance: f64) -> u64 {
    distance.max(0.0).round() as u64
}
