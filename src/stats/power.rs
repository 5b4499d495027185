// Power aggregation over a set of entities, and the market-share ratio built on it.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::Result;
use crate::models::{EntityId, PowerRecord, StaticInfo};
use crate::record_repo::RecordRepo;

/// Tolerance around zero for the derived deal/committed split.
pub const POWER_EPSILON: f64 = 1e-10;

/// Verified-deal sectors count 10x toward quality-adjusted power.
const DEAL_MULTIPLIER_EXCESS: f64 = 9.0;

/// Deal-backed and committed-only raw power (PiB) derived from the raw/QA gap.
pub fn split_power(raw_pib: f64, qap_pib: f64) -> (f64, f64) {
    let deal = (qap_pib - raw_pib) / DEAL_MULTIPLIER_EXCESS;
    (deal, raw_pib - deal)
}

/// True when an entity has committed capacity but no deal-backed capacity.
pub fn is_capacity_only(deal_pib: f64, committed_pib: f64) -> bool {
    committed_pib > POWER_EPSILON && deal_pib < POWER_EPSILON
}

/// Fold power records into totals. With `exclude_capacity_only`, entities without any
/// deal power are left out entirely (count included).
pub fn static_by_power(powers: &[PowerRecord], exclude_capacity_only: bool) -> StaticInfo {
    let mut info = StaticInfo::default();
    for p in powers {
        let raw = p.raw_byte_power.to_pib();
        let qap = p.quality_adj_power.to_pib();
        let (deal, committed) = split_power(raw, qap);

        if exclude_capacity_only && is_capacity_only(deal, committed) {
            debug!(entity = %p.entity, "no deal power, excluded");
            continue;
        }

        info.count += 1;
        info.raw_byte_power += raw;
        info.quality_adj_power += qap;
        info.deal_power += deal;
        info.committed_power += committed;
    }
    info
}

/// Latest power per (deduplicated) entity strictly before `before`, folded into totals.
pub async fn aggregate(
    repo: &RecordRepo,
    ids: impl IntoIterator<Item = EntityId>,
    before: Option<DateTime<Utc>>,
    exclude_capacity_only: bool,
) -> Result<StaticInfo> {
    let ids: Vec<EntityId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(StaticInfo::default());
    }
    let powers = repo.latest_powers(&ids, before).await?;
    Ok(static_by_power(&powers, exclude_capacity_only))
}

/// Share of `a` in `a + b` by quality-adjusted power; 0.0 when `a` has none.
pub fn proportion(a: &StaticInfo, b: &StaticInfo) -> f64 {
    if a.quality_adj_power == 0.0 {
        return 0.0;
    }
    a.quality_adj_power / (a.quality_adj_power + b.quality_adj_power)
}
