// Resolve which entities belong to a category as of a boundary, from agent labels.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::Result;
use crate::models::{AgentRecord, Category, EntityId, QueryOptions, classify};
use crate::record_repo::RecordRepo;

/// Time windows used when picking label rows. Ingestion writes labels in batches, so
/// these decide which rows count as "the current batch".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverPolicy {
    /// A boundary closer than this to the newest label before it is pushed forward by the
    /// same amount, so a batch still being written is read whole.
    pub batch_guard: chrono::Duration,
    /// Labels older than the newest label in the result by more than this are dropped.
    pub freshness_window: chrono::Duration,
    /// Max outstanding per-entity lookups when materialising a snapshot.
    pub fetch_concurrency: usize,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            batch_guard: chrono::Duration::minutes(5),
            freshness_window: chrono::Duration::minutes(70),
            fetch_concurrency: 256,
        }
    }
}

/// Entity ids whose latest label (strictly before `opts.before`, tag-filtered) is fresh and
/// in `opts.category`. No labels at all yields an empty set.
pub async fn resolve(
    repo: &RecordRepo,
    policy: &ResolverPolicy,
    opts: &QueryOptions,
) -> Result<BTreeSet<EntityId>> {
    let tag = opts.tag_filter();
    let mut rows = repo.latest_agents(tag, opts.before).await?;

    if let Some(before) = opts.before
        && let Some(pushed) = guarded_boundary(&rows, before, policy.batch_guard)
    {
        debug!(%before, %pushed, "boundary inside an ingestion batch, moving it forward");
        rows = repo.latest_agents(tag, Some(pushed)).await?;
    }

    Ok(select_entities(
        &rows,
        policy.freshness_window,
        opts.category_filter(),
    ))
}

/// `Some(before + guard)` when the newest row lands within `guard` of `before`.
pub fn guarded_boundary(
    rows: &[AgentRecord],
    before: DateTime<Utc>,
    guard: chrono::Duration,
) -> Option<DateTime<Utc>> {
    let newest = rows.iter().map(|r| r.updated_at).max()?;
    (before - newest < guard).then(|| before + guard)
}

/// Freshness filter plus category filter over already-fetched label rows.
pub fn select_entities(
    rows: &[AgentRecord],
    freshness_window: chrono::Duration,
    category: Option<Category>,
) -> BTreeSet<EntityId> {
    let Some(newest) = rows.iter().map(|r| r.updated_at).max() else {
        return BTreeSet::new();
    };
    let cutoff = newest - freshness_window;
    rows.iter()
        .filter(|r| r.updated_at >= cutoff)
        .filter(|r| category.is_none_or(|c| classify(&r.name) == c))
        .map(|r| r.entity)
        .collect()
}
