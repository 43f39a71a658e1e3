//! Live location tracking for travel companion clients: distance travelled,
//! route timing, group/tour member polling and stop-proximity alarms.

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod notify;
pub mod realtime;
pub mod tracking;

pub use error::{Result, TrackerError};
