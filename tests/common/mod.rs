// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use static_power::models::*;
use static_power::record_repo::RecordRepo;
use std::sync::Arc;
use tempfile::TempDir;

/// Fixed base time plus `minutes`.
pub fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub async fn open_repo() -> (TempDir, Arc<RecordRepo>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.db");
    let repo = RecordRepo::connect(path.to_str().unwrap(), 4).await.unwrap();
    repo.init().await.unwrap();
    (dir, Arc::new(repo))
}

/// Writes a power row bypassing `RecordRepo`, so stored values can be malformed.
pub async fn insert_raw_power(dir: &TempDir, entity: u64, raw: &str, qap: &str, at: DateTime<Utc>) {
    let url = format!("sqlite:{}", dir.path().join("records.db").display());
    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    sqlx::query(
        "INSERT INTO power_records (entity_id, raw_byte_power, quality_adj_power, updated_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(entity as i64)
    .bind(raw)
    .bind(qap)
    .bind(at.timestamp_millis())
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;
}

pub fn power(entity: u64, raw_pib: u64, qap_pib: u64, at: DateTime<Utc>) -> PowerRecord {
    PowerRecord {
        entity: EntityId(entity),
        raw_byte_power: Power::from_pib(raw_pib),
        quality_adj_power: Power::from_pib(qap_pib),
        updated_at: at,
    }
}

pub fn agent(entity: u64, name: &str, at: DateTime<Utc>) -> AgentRecord {
    AgentRecord {
        entity: EntityId(entity),
        name: name.into(),
        tag: None,
        updated_at: at,
    }
}

pub fn tagged_agent(entity: u64, name: &str, tag: &str, at: DateTime<Utc>) -> AgentRecord {
    AgentRecord {
        tag: Some(tag.into()),
        ..agent(entity, name, at)
    }
}

pub fn peer(entity: u64, peer_id: &str, addrs: &[&str], at: DateTime<Utc>) -> PeerRecord {
    PeerRecord {
        entity: EntityId(entity),
        peer_id: peer_id.into(),
        multiaddrs: addrs.iter().map(|s| s.to_string()).collect(),
        updated_at: at,
    }
}

pub fn brief(entity: u64, agent: &str, qap: f64) -> Brief {
    Brief {
        entity: EntityId(entity),
        agent: agent.into(),
        qap,
    }
}
