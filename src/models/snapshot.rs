// Derived views: per-entity briefs, diffs between two snapshots, category summaries and
// power aggregates. None of these are persisted.

use serde::{Deserialize, Serialize};

use super::{Category, Entity, EntityId};

/// What a snapshot keeps per entity: agent label and quality-adjusted power in PiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub entity: EntityId,
    pub agent: String,
    pub qap: f64,
}

impl Brief {
    pub fn from_entity(entity: &Entity) -> Self {
        Brief {
            entity: entity.id,
            agent: entity
                .agent
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            qap: entity
                .power
                .as_ref()
                .map(|p| p.quality_adj_power.to_pib())
                .unwrap_or(0.0),
        }
    }
}

/// Declaration order is the sort priority inside one category (later sorts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    QapChanged,
    CategoryChanged,
    Removed,
    Added,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::QapChanged => "qap_changed",
            DiffKind::CategoryChanged => "category_changed",
            DiffKind::Removed => "removed",
            DiffKind::Added => "added",
        }
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    pub entity: EntityId,
    pub kind: DiffKind,
    /// Category after the change (before it, for removals).
    pub category: Category,
    /// Signed change of quality-adjusted power in PiB.
    pub qap_delta: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub qap: f64,
}

/// Power totals of a set of entities, all in PiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticInfo {
    pub count: usize,
    pub raw_byte_power: f64,
    pub quality_adj_power: f64,
    /// Raw power of verified-deal sectors.
    pub deal_power: f64,
    /// Raw power of committed-capacity sectors.
    pub committed_power: f64,
}
