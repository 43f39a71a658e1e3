pub mod backend;
pub mod poller;

pub use backend::{HttpMembersBackend, MembersBackend, Room, RoomKind};
pub use poller::{MemberPoller, MemberSnapshot, MembersHandle, MEMBER_POLL_INTERVAL};
