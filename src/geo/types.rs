use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Both coordinates are finite and within latitude/longitude range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Ordered stops of an itinerary. Only `advance` moves the cursor; the
/// proximity evaluator reads it but never changes it.
#[derive(Debug, Clone, Default)]
pub struct RoutePlan {
    stops: Vec<RouteStop>,
    next_index: usize,
}

impl RoutePlan {
    pub fn new(stops: Vec<RouteStop>) -> Self {
        Self {
            stops,
            next_index: 0,
        }
    }

    pub fn next_stop(&self) -> Option<&RouteStop> {
        self.stops.get(self.next_index)
    }

    /// Get the current stop and every stop after it, in visiting order.
    pub fn upcoming(&self) -> &[RouteStop] {
        self.stops.get(self.next_index..).unwrap_or_default()
    }

    /// Mark the current stop visited. Returns the new next stop, if any.
    pub fn advance(&mut self) -> Option<&RouteStop> {
        if self.next_index < self.stops.len() {
            self.next_index += 1;
        }
        self.next_stop()
    }

    pub fn visited_count(&self) -> usize {
        self.next_index
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLocation {
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_in_emergency: bool,
    #[serde(default)]
    pub emergency_type: Option<String>,
    #[serde(default)]
    pub is_sharing_location: bool,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Members sharing their location right now.
pub fn sharing(members: &[MemberLocation]) -> impl Iterator<Item = &MemberLocation> {
    members.iter().filter(|m| m.is_sharing_location)
}

pub fn in_emergency(members: &[MemberLocation]) -> impl Iterator<Item = &MemberLocation> {
    members.iter().filter(|m| m.is_in_emergency)
}
