use crate::error::{Result, TrackerError};
use crate::geo::MemberLocation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Group,
    Tour,
}

impl RoomKind {
    fn path_segment(self) -> &'static str {
        match self {
            RoomKind::Group => "groups",
            RoomKind::Tour => "tours",
        }
    }

    fn id_field(self) -> &'static str {
        match self {
            RoomKind::Group => "groupId",
            RoomKind::Tour => "tourId",
        }
    }
}

/// A backend grouping whose participants are polled together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub kind: RoomKind,
    pub id: String,
}

impl Room {
    pub fn new(kind: RoomKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::new(RoomKind::Group, id)
    }

    pub fn tour(id: impl Into<String>) -> Self {
        Self::new(RoomKind::Tour, id)
    }
}

#[async_trait]
pub trait MembersBackend: Send + Sync {
    /// One round trip returning the full member list of `room`.
    async fn fetch_members(&self, room: &Room, token: &str) -> Result<Vec<MemberLocation>>;
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    data: Vec<MemberLocation>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct HttpMembersBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMembersBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn members_url(&self, kind: RoomKind) -> String {
        format!("{}/{}/get-room-members", self.base_url, kind.path_segment())
    }
}

#[async_trait]
impl MembersBackend for HttpMembersBackend {
    async fn fetch_members(&self, room: &Room, token: &str) -> Result<Vec<MemberLocation>> {
        let mut body = serde_json::Map::new();
        body.insert(
            room.kind.id_field().to_string(),
            serde_json::Value::String(room.id.clone()),
        );

        let response = self
            .client
            .post(self.members_url(room.kind))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MembersResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.data)
    }
}
