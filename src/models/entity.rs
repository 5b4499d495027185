// Tracked entities and the three append-only record kinds observed for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Power;

/// Storage provider id. 0 is the network-total pseudo-entity and never means "absent";
/// absence is always `Option<EntityId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const NETWORK: EntityId = EntityId(0);

    pub fn is_network(&self) -> bool {
        *self == Self::NETWORK
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    pub entity: EntityId,
    pub peer_id: String,
    #[serde(default)]
    pub multiaddrs: Vec<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerRecord {
    pub entity: EntityId,
    pub raw_byte_power: Power,
    pub quality_adj_power: Power,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Agent label as reported by the peer, plus the region tag of the crawler that saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub entity: EntityId,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Latest record of each kind strictly before some boundary; each may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub peer: Option<PeerRecord>,
    pub power: Option<PowerRecord>,
    pub agent: Option<AgentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Peer,
    Power,
    Agent,
    NetworkPower,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Peer,
        RecordKind::Power,
        RecordKind::Agent,
        RecordKind::NetworkPower,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Peer => "peer_records",
            RecordKind::Power => "power_records",
            RecordKind::Agent => "agent_records",
            RecordKind::NetworkPower => "network_power_records",
        }
    }
}
