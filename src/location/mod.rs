pub mod channel;
pub mod provider;
pub mod replay;

pub use channel::ChannelProvider;
pub use provider::{LocationProvider, PermissionStatus, SamplingPolicy};
pub use replay::ReplayProvider;
