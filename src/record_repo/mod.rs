// SQLite time-series store for peer, power and agent records.
// Rows are append-only; every read asks for the newest row strictly before a boundary.
// Timestamps are UTC epoch milliseconds, capacity values decimal TEXT.

mod blob;

use crate::error::{Error, Result};
use crate::models::{AgentRecord, EntityId, PeerRecord, Power, PowerRecord, RecordKind};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Max bound ids per grouped query (well below SQLite's variable limit).
const IN_CHUNK: usize = 500;

pub struct RecordRepo {
    pool: SqlitePool,
}

impl RecordRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS entities (id INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS peer_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL,
                peer_id TEXT NOT NULL,
                multiaddrs BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS power_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL,
                raw_byte_power TEXT NOT NULL,
                quality_adj_power TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                tag TEXT,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS network_power_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                raw_byte_power TEXT NOT NULL,
                quality_adj_power TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for table in ["peer_records", "power_records", "agent_records"] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_entity_updated ON {table}(entity_id, updated_at)"
            ))
            .execute(&self.pool)
            .await?;
        }
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_agent_records_tag_updated ON agent_records(tag, updated_at)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_network_power_updated ON network_power_records(updated_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // --- ingestion ---

    #[instrument(skip(self, records), fields(repo = "records", operation = "save_peers", records_count = records.len()))]
    pub async fn save_peers(&self, records: &[PeerRecord]) -> Result<()> {
        if records.iter().any(|r| r.entity.is_network()) {
            return Err(Error::ReservedEntity);
        }
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in records {
            register_entity(&mut tx, r.entity).await?;
            let multiaddrs = blob::encode_multiaddrs(&r.multiaddrs)?;
            sqlx::query(
                "INSERT INTO peer_records (entity_id, peer_id, multiaddrs, updated_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(r.entity.0 as i64)
            .bind(&r.peer_id)
            .bind(&multiaddrs)
            .bind(r.updated_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Network-total observations (entity 0) go to their own table.
    #[instrument(skip(self, records), fields(repo = "records", operation = "save_powers", records_count = records.len()))]
    pub async fn save_powers(&self, records: &[PowerRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in records {
            if r.entity.is_network() {
                sqlx::query(
                    "INSERT INTO network_power_records (raw_byte_power, quality_adj_power, updated_at) VALUES ($1, $2, $3)",
                )
                .bind(r.raw_byte_power.to_string())
                .bind(r.quality_adj_power.to_string())
                .bind(r.updated_at.timestamp_millis())
                .execute(&mut *tx)
                .await?;
                continue;
            }
            register_entity(&mut tx, r.entity).await?;
            sqlx::query(
                "INSERT INTO power_records (entity_id, raw_byte_power, quality_adj_power, updated_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(r.entity.0 as i64)
            .bind(r.raw_byte_power.to_string())
            .bind(r.quality_adj_power.to_string())
            .bind(r.updated_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, records), fields(repo = "records", operation = "save_agents", records_count = records.len()))]
    pub async fn save_agents(&self, records: &[AgentRecord]) -> Result<()> {
        if records.iter().any(|r| r.entity.is_network()) {
            return Err(Error::ReservedEntity);
        }
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in records {
            register_entity(&mut tx, r.entity).await?;
            sqlx::query(
                "INSERT INTO agent_records (entity_id, name, tag, updated_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(r.entity.0 as i64)
            .bind(&r.name)
            .bind(r.tag.as_deref().filter(|t| !t.is_empty()))
            .bind(r.updated_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_peer(&self, record: &PeerRecord) -> Result<()> {
        self.save_peers(std::slice::from_ref(record)).await
    }

    pub async fn insert_power(&self, record: &PowerRecord) -> Result<()> {
        self.save_powers(std::slice::from_ref(record)).await
    }

    pub async fn insert_agent(&self, record: &AgentRecord) -> Result<()> {
        self.save_agents(std::slice::from_ref(record)).await
    }

    // --- per-entity reads ---

    /// Every entity that has ever had a record, ascending.
    pub async fn entity_ids(&self) -> Result<Vec<EntityId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM entities ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|id| EntityId(id as u64)).collect())
    }

    pub async fn latest_peer(
        &self,
        entity: EntityId,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<PeerRecord>> {
        let row = sqlx::query(
            "SELECT entity_id, peer_id, multiaddrs, updated_at FROM peer_records
             WHERE entity_id = $1 AND ($2 IS NULL OR updated_at < $2)
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(entity.0 as i64)
        .bind(before.map(|b| b.timestamp_millis()))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_peer_row).transpose()
    }

    pub async fn latest_power(
        &self,
        entity: EntityId,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<PowerRecord>> {
        let row = sqlx::query(
            "SELECT entity_id, raw_byte_power, quality_adj_power, updated_at FROM power_records
             WHERE entity_id = $1 AND ($2 IS NULL OR updated_at < $2)
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(entity.0 as i64)
        .bind(before.map(|b| b.timestamp_millis()))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_power_row).transpose()
    }

    /// With a `tag`, only records carrying exactly that tag are considered.
    pub async fn latest_agent(
        &self,
        entity: EntityId,
        before: Option<DateTime<Utc>>,
        tag: Option<&str>,
    ) -> Result<Option<AgentRecord>> {
        let row = sqlx::query(
            "SELECT entity_id, name, tag, updated_at FROM agent_records
             WHERE entity_id = $1 AND ($2 IS NULL OR updated_at < $2) AND ($3 IS NULL OR tag = $3)
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(entity.0 as i64)
        .bind(before.map(|b| b.timestamp_millis()))
        .bind(tag)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_agent_row).transpose()
    }

    pub async fn latest_network_power(
        &self,
        before: Option<DateTime<Utc>>,
    ) -> Result<Option<PowerRecord>> {
        let row = sqlx::query(
            "SELECT 0 AS entity_id, raw_byte_power, quality_adj_power, updated_at FROM network_power_records
             WHERE ($1 IS NULL OR updated_at < $1)
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(before.map(|b| b.timestamp_millis()))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_power_row).transpose()
    }

    // --- grouped reads ---

    /// Latest power record per entity, one grouped query per chunk of ids.
    /// Entities without a record before the boundary are simply absent from the result.
    #[instrument(skip(self, ids), fields(repo = "records", operation = "latest_powers", ids_count = ids.len()))]
    pub async fn latest_powers(
        &self,
        ids: &[EntityId],
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<PowerRecord>> {
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(IN_CHUNK) {
            // SQLite fills bare columns from the row that holds MAX(updated_at).
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT entity_id, raw_byte_power, quality_adj_power, MAX(updated_at) AS updated_at
                 FROM power_records WHERE entity_id IN (",
            );
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(id.0 as i64);
            }
            separated.push_unseparated(")");
            if let Some(before) = before {
                qb.push(" AND power_records.updated_at < ")
                    .push_bind(before.timestamp_millis());
            }
            qb.push(" GROUP BY entity_id");

            let rows = qb.build().fetch_all(&self.pool).await?;
            for row in &rows {
                out.push(parse_power_row(row)?);
            }
        }
        Ok(out)
    }

    /// Latest agent record per entity, optionally restricted to one tag.
    #[instrument(skip(self), fields(repo = "records", operation = "latest_agents"))]
    pub async fn latest_agents(
        &self,
        tag: Option<&str>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<AgentRecord>> {
        let rows = sqlx::query(
            "SELECT entity_id, name, tag, MAX(updated_at) AS updated_at FROM agent_records
             WHERE ($1 IS NULL OR agent_records.tag = $1)
               AND ($2 IS NULL OR agent_records.updated_at < $2)
             GROUP BY entity_id",
        )
        .bind(tag)
        .bind(before.map(|b| b.timestamp_millis()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_agent_row).collect()
    }

    // --- retention ---

    /// Delete rows of `kind` strictly older than `cutoff`. Returns rows deleted.
    #[instrument(skip(self), fields(repo = "records", operation = "purge_before"))]
    pub async fn purge_before(&self, kind: RecordKind, cutoff: DateTime<Utc>) -> Result<u64> {
        let r = sqlx::query(&format!(
            "DELETE FROM {} WHERE updated_at < $1",
            kind.table()
        ))
        .bind(cutoff.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }

    /// Purge every record kind older than `now - ttl`, then drop registry entries that no
    /// longer have any record.
    #[instrument(skip(self), fields(repo = "records", operation = "purge_older_than"))]
    pub async fn purge_older_than(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<u64> {
        let cutoff = now - ttl;
        let mut deleted = 0;
        for kind in RecordKind::ALL {
            deleted += self.purge_before(kind, cutoff).await?;
        }
        sqlx::query(
            "DELETE FROM entities WHERE id NOT IN (
                SELECT entity_id FROM peer_records
                UNION SELECT entity_id FROM power_records
                UNION SELECT entity_id FROM agent_records)",
        )
        .execute(&self.pool)
        .await?;
        Ok(deleted)
    }

    /// Reclaim space after deletes (run periodically after purging).
    #[instrument(skip(self), fields(repo = "records", operation = "vacuum"))]
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

async fn register_entity(conn: &mut SqliteConnection, entity: EntityId) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO entities (id) VALUES ($1)")
        .bind(entity.0 as i64)
        .execute(conn)
        .await?;
    Ok(())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        Error::Storage(sqlx::Error::Decode(
            format!("timestamp {} out of range", ms).into(),
        ))
    })
}

fn parse_power(entity: EntityId, value: String) -> Result<Power> {
    Power::from_str(&value).map_err(|_| Error::MalformedPower { entity, value })
}

fn parse_peer_row(row: &SqliteRow) -> Result<PeerRecord> {
    let entity = EntityId(row.try_get::<i64, _>("entity_id")? as u64);
    let peer_id: String = row.try_get("peer_id")?;
    let multiaddrs: Vec<u8> = row.try_get("multiaddrs")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(PeerRecord {
        entity,
        peer_id,
        multiaddrs: blob::decode_multiaddrs(&multiaddrs)?,
        updated_at: from_millis(updated_at)?,
    })
}

fn parse_power_row(row: &SqliteRow) -> Result<PowerRecord> {
    let entity = EntityId(row.try_get::<i64, _>("entity_id")? as u64);
    let raw: String = row.try_get("raw_byte_power")?;
    let qa: String = row.try_get("quality_adj_power")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(PowerRecord {
        entity,
        raw_byte_power: parse_power(entity, raw)?,
        quality_adj_power: parse_power(entity, qa)?,
        updated_at: from_millis(updated_at)?,
    })
}

fn parse_agent_row(row: &SqliteRow) -> Result<AgentRecord> {
    let entity = EntityId(row.try_get::<i64, _>("entity_id")? as u64);
    let name: String = row.try_get("name")?;
    let tag: Option<String> = row.try_get("tag")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(AgentRecord {
        entity,
        name,
        tag,
        updated_at: from_millis(updated_at)?,
    })
}
