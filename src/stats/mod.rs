// Query-side statistics: category membership, power aggregates, snapshots and diffs.
// Pure folds live in the submodules; StatsService wires them to a RecordRepo handle.

pub mod diff;
pub mod power;
pub mod resolver;

pub use diff::{DiffReport, diff, index_briefs, summarize};
pub use power::{aggregate, proportion, static_by_power};
pub use resolver::{ResolverPolicy, resolve};

use chrono::{DateTime, Timelike, Utc};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{Brief, Category, Entity, EntityId, PowerRecord, QueryOptions, StaticInfo};
use crate::record_repo::RecordRepo;

/// Days covered by a static series.
pub const SERIES_DAYS: i64 = 7;
/// Only boundaries on hours divisible by this are kept.
pub const SERIES_STEP_HOURS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub info: StaticInfo,
}

pub struct StatsService {
    repo: Arc<RecordRepo>,
    policy: ResolverPolicy,
}

impl StatsService {
    pub fn new(repo: Arc<RecordRepo>, policy: ResolverPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn repo(&self) -> &RecordRepo {
        &self.repo
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    pub async fn resolve(&self, opts: &QueryOptions) -> Result<BTreeSet<EntityId>> {
        resolve(&self.repo, &self.policy, opts).await
    }

    /// Aggregate power of the entities `opts` resolves to.
    #[instrument(skip(self), fields(operation = "static_info"))]
    pub async fn static_info(
        &self,
        opts: &QueryOptions,
        exclude_capacity_only: bool,
    ) -> Result<StaticInfo> {
        let ids = self.resolve(opts).await?;
        aggregate(&self.repo, ids, opts.before, exclude_capacity_only).await
    }

    /// Venus-family share of Venus + Lotus quality-adjusted power.
    pub async fn proportion(&self, opts: &QueryOptions) -> Result<f64> {
        let venus = self
            .static_info(&opts.clone().category(Category::Venus), false)
            .await?;
        let lotus = self
            .static_info(&opts.clone().category(Category::Lotus), false)
            .await?;
        Ok(proportion(&venus, &lotus))
    }

    /// `static_info` for one category at every series boundary, newest first.
    pub async fn static_series(
        &self,
        category: Category,
        tag: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeriesPoint>> {
        let mut out = Vec::new();
        for at in series_boundaries(now) {
            let opts = QueryOptions {
                before: Some(at),
                after: None,
                tag: tag.clone(),
                category: Some(category),
            };
            let info = self.static_info(&opts, false).await?;
            out.push(SeriesPoint { at, info });
        }
        Ok(out)
    }

    /// Composite view of every entity with at least one record before `opts.before`,
    /// sorted by id. Lookups run concurrently up to the policy limit; the first failure
    /// aborts the call.
    #[instrument(skip(self), fields(operation = "entities"))]
    pub async fn entities(&self, opts: &QueryOptions) -> Result<Vec<Entity>> {
        let ids = self.repo.entity_ids().await?;
        let repo = self.repo.as_ref();
        let before = opts.before;
        let tag = opts.tag_filter();

        let mut entities: Vec<Entity> = stream::iter(ids)
            .map(|id| load_entity(repo, id, before, tag))
            .buffer_unordered(self.policy.fetch_concurrency.max(1))
            .try_filter(|e| {
                futures_util::future::ready(
                    e.peer.is_some() || e.power.is_some() || e.agent.is_some(),
                )
            })
            .try_collect()
            .await?;
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    pub async fn snapshot(&self, opts: &QueryOptions) -> Result<Vec<Brief>> {
        let entities = self.entities(opts).await?;
        Ok(entities.iter().map(Brief::from_entity).collect())
    }

    /// Snapshot at `opts.before` against snapshot at `opts.after`.
    #[instrument(skip(self), fields(operation = "diff"))]
    pub async fn diff(&self, opts: &QueryOptions) -> Result<DiffReport> {
        let (Some(before), Some(after)) = (opts.before, opts.after) else {
            return Err(Error::InvalidRange);
        };
        if before >= after {
            return Err(Error::InvalidRange);
        }
        let mut at_before = opts.clone();
        at_before.after = None;
        let mut at_after = opts.clone();
        at_after.before = Some(after);
        at_after.after = None;

        let old = self.snapshot(&at_before).await?;
        let new = self.snapshot(&at_after).await?;
        Ok(DiffReport {
            before: summarize(&old),
            after: summarize(&new),
            differences: diff(&index_briefs(&old), &index_briefs(&new)),
        })
    }

    pub async fn network_power(&self, before: Option<DateTime<Utc>>) -> Result<Option<PowerRecord>> {
        self.repo.latest_network_power(before).await
    }
}

async fn load_entity(
    repo: &RecordRepo,
    id: EntityId,
    before: Option<DateTime<Utc>>,
    tag: Option<&str>,
) -> Result<Entity> {
    let (peer, power, agent) = tokio::try_join!(
        repo.latest_peer(id, before),
        repo.latest_power(id, before),
        repo.latest_agent(id, before, tag),
    )?;
    Ok(Entity {
        id,
        peer,
        power,
        agent,
    })
}

/// Hour boundaries over the last `SERIES_DAYS` days that fall on even hours (UTC),
/// newest first. The newest is at most two hours after `now`.
pub fn series_boundaries(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let secs = now.timestamp() + 2 * 3600;
    let mut at = DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(now);
    let mut out = Vec::with_capacity((SERIES_DAYS * 24 / SERIES_STEP_HOURS as i64) as usize);
    for _ in 0..SERIES_DAYS * 24 {
        at -= chrono::Duration::hours(1);
        if at.hour() % SERIES_STEP_HOURS == 0 {
            out.push(at);
        }
    }
    out
}
