pub mod alarm;
pub mod distance;
pub mod proximity;
pub mod session;
pub mod timer;

pub use alarm::{AlarmState, AlarmTrigger, StopProximityEvaluator};
pub use distance::DistanceAccumulator;
pub use session::{TrackingHandle, TrackingSession, TrackingSnapshot, TrackingSummary};
pub use timer::RouteTimer;
