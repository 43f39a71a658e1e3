use crate::geo::{self, MemberLocation};
use crate::realtime::backend::{MembersBackend, Room};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const MEMBER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Last applied poll outcome. `members` always comes from the most recent
/// successful poll; a failure only sets `error`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    pub members: Vec<MemberLocation>,
    pub sharing: usize,
    pub emergencies: usize,
    pub error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct PollState {
    snapshot: MemberSnapshot,
    last_applied_seq: u64,
}

/// Read-only view of the poller's state, cheap to clone into other tasks.
#[derive(Clone)]
pub struct MembersHandle {
    state: Arc<RwLock<PollState>>,
}

impl MembersHandle {
    pub async fn snapshot(&self) -> MemberSnapshot {
        self.state.read().await.snapshot.clone()
    }
}

/// Polls a room's member positions on a fixed interval while enabled.
///
/// Every tick issues its own request without waiting for earlier ones. Each
/// request carries a sequence number and a response is applied only if it is
/// newer than the last applied one. Stopping bumps the generation so responses
/// still in flight are dropped when they land.
pub struct MemberPoller {
    backend: Arc<dyn MembersBackend>,
    room: Room,
    token: String,
    interval: Duration,
    state: Arc<RwLock<PollState>>,
    next_seq: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl MemberPoller {
    pub fn new(backend: Arc<dyn MembersBackend>, room: Room, token: impl Into<String>) -> Self {
        Self {
            backend,
            room,
            token: token.into(),
            interval: MEMBER_POLL_INTERVAL,
            state: Arc::new(RwLock::new(PollState::default())),
            next_seq: Arc::new(AtomicU64::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn handle(&self) -> MembersHandle {
        MembersHandle {
            state: self.state.clone(),
        }
    }

    pub async fn snapshot(&self) -> MemberSnapshot {
        self.handle().snapshot().await
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start or stop polling. Enabling without a room id or token does nothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.start();
        } else {
            self.stop();
        }
    }

    fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        if self.room.id.trim().is_empty() || self.token.trim().is_empty() {
            debug!(room = ?self.room, "member polling needs a room id and token, not starting");
            return;
        }

        info!(
            kind = ?self.room.kind,
            room = %self.room.id,
            interval_ms = self.interval.as_millis() as u64,
            "starting member poller"
        );

        let generation = self.generation.load(Ordering::SeqCst);
        let ctx = PollContext {
            backend: self.backend.clone(),
            room: self.room.clone(),
            token: self.token.clone(),
            state: self.state.clone(),
            generation: self.generation.clone(),
        };
        let next_seq = self.next_seq.clone();
        let period = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let seq = next_seq.fetch_add(1, Ordering::SeqCst) + 1;
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.poll_once(seq, generation).await });
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            task.abort();
            info!(room = %self.room.id, "member poller stopped");
        }
    }
}

impl Drop for MemberPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
struct PollContext {
    backend: Arc<dyn MembersBackend>,
    room: Room,
    token: String,
    state: Arc<RwLock<PollState>>,
    generation: Arc<AtomicU64>,
}

impl PollContext {
    async fn poll_once(&self, seq: u64, generation: u64) {
        let result = self.backend.fetch_members(&self.room, &self.token).await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(seq, "poller stopped while request was in flight, dropping response");
            return;
        }
        if seq <= state.last_applied_seq {
            debug!(
                seq,
                last_applied = state.last_applied_seq,
                "stale member response dropped"
            );
            return;
        }
        state.last_applied_seq = seq;

        match result {
            Ok(members) => {
                warn_new_emergencies(&state.snapshot.members, &members);
                debug!(seq, count = members.len(), "member list updated");
                state.snapshot.sharing = geo::sharing(&members).count();
                state.snapshot.emergencies = geo::in_emergency(&members).count();
                state.snapshot.members = members;
                state.snapshot.error = None;
                state.snapshot.last_success = Some(Utc::now());
            }
            Err(e) => {
                warn!(seq, room = %self.room.id, error = %e, "member poll failed");
                state.snapshot.error = Some(e.to_string());
            }
        }
    }
}

fn warn_new_emergencies(previous: &[MemberLocation], current: &[MemberLocation]) {
    let known: HashSet<&str> = geo::in_emergency(previous)
        .map(|m| m.user_id.as_str())
        .collect();

    for member in geo::in_emergency(current).filter(|m| !known.contains(m.user_id.as_str())) {
        warn!(
            user_id = %member.user_id,
            username = %member.username,
            emergency = member.emergency_type.as_deref().unwrap_or("unspecified"),
            latitude = member.latitude,
            longitude = member.longitude,
            "member reported an emergency"
        );
    }
}
