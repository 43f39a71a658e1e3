use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    Driving,
    Cycling,
    Transit,
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TravelMode::Walking => "walking",
            TravelMode::Driving => "driving",
            TravelMode::Cycling => "cycling",
            TravelMode::Transit => "transit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub sound: String,
    pub priority: String,
    pub vibration_pattern: Vec<u32>,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub stop_name: String,
    pub distance: u64,
    pub route_mode: TravelMode,
    #[serde(rename = "type")]
    pub kind: String,
    pub screen: String,
}

/// Delivers local notifications immediately (no scheduled trigger).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, notification: &LocalNotification) -> Result<()>;
}

/// Writes notifications to the log. Used when no device channel is attached.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn dispatch(&self, notification: &LocalNotification) -> Result<()> {
        let payload = serde_json::to_string(notification)?;
        info!(title = %notification.title, %payload, "local notification");
        Ok(())
    }
}
