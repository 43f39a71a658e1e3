use crate::notify::TravelMode;
use crate::realtime::{Room, RoomKind};
use crate::tracking::proximity::STOP_ALARM_RADIUS_METERS;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "companion-tracker")]
#[command(about = "Live member tracking and stop alarms for travel companion trips")]
pub struct Args {
    /// Port to run the status HTTP server on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Backend base URL, e.g. https://api.example.com
    #[arg(long, env = "TRACKER_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    /// Bearer token for backend calls
    #[arg(long, env = "TRACKER_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Kind of room whose members are polled
    #[arg(long, value_enum, env = "TRACKER_ROOM_KIND", default_value = "group")]
    pub room_kind: RoomKind,

    /// Group or tour id
    #[arg(long, env = "TRACKER_ROOM_ID", default_value = "")]
    pub room_id: String,

    /// Poll room members while tracking
    #[arg(long, env = "TRACKER_POLL_MEMBERS", default_value_t = true, action = clap::ArgAction::Set)]
    pub poll_members: bool,

    /// Member poll interval in seconds
    #[arg(long, env = "TRACKER_POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Distance to the next stop that raises the alarm, in meters
    #[arg(long, env = "TRACKER_ALARM_RADIUS_M", default_value_t = STOP_ALARM_RADIUS_METERS)]
    pub alarm_radius_m: f64,

    /// Travel mode reported in stop notifications
    #[arg(long, value_enum, env = "TRACKER_TRAVEL_MODE", default_value = "walking")]
    pub travel_mode: TravelMode,

    /// Route stops CSV (location_name,latitude,longitude,note)
    #[arg(long, env = "TRACKER_ROUTE")]
    pub route: Option<PathBuf>,

    /// Recorded track CSV (latitude,longitude,timestamp) to replay as the device position
    #[arg(long, env = "TRACKER_TRACK")]
    pub track: Option<PathBuf>,

    /// Replay speed multiplier for --track
    #[arg(long, env = "TRACKER_REPLAY_SPEED", default_value_t = 1.0)]
    pub replay_speed: f64,

    /// Emit logs as JSON
    #[arg(long, env = "TRACKER_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    pub fn room(&self) -> Room {
        Room::new(self.room_kind, self.room_id.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["companion-tracker"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.alarm_radius_m, 50.0);
        assert_eq!(args.poll_interval(), Duration::from_secs(5));
        assert!(args.poll_members);
        assert_eq!(args.room().kind, RoomKind::Group);
    }

    #[test]
    fn tour_room_and_mode_flags() {
        let args = Args::try_parse_from([
            "companion-tracker",
            "--room-kind",
            "tour",
            "--room-id",
            "t-42",
            "--travel-mode",
            "driving",
            "--poll-members",
            "false",
        ])
        .unwrap();
        assert_eq!(args.room(), Room::tour("t-42"));
        assert_eq!(args.travel_mode, TravelMode::Driving);
        assert!(!args.poll_members);
    }
}
