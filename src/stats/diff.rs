// Structural diff between two snapshots and per-category summaries.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{Brief, Category, DiffKind, Difference, EntityId, Summary, classify};

/// Kept entities whose category did not change and whose QAP moved less than this are
/// not reported.
pub const QAP_EPSILON: f64 = 1e-10;

/// Categories always present in a summary.
pub const TRACKED_CATEGORIES: [Category; 2] = [Category::Venus, Category::Lotus];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub before: BTreeMap<Category, Summary>,
    pub after: BTreeMap<Category, Summary>,
    pub differences: Vec<Difference>,
}

/// Index briefs by entity. A later duplicate replaces an earlier one.
pub fn index_briefs(briefs: &[Brief]) -> BTreeMap<EntityId, Brief> {
    briefs.iter().map(|b| (b.entity, b.clone())).collect()
}

/// Differences from `before` to `after`, ordered by category, kind, |delta| and entity id,
/// all descending.
pub fn diff(
    before: &BTreeMap<EntityId, Brief>,
    after: &BTreeMap<EntityId, Brief>,
) -> Vec<Difference> {
    let mut diffs = Vec::new();

    for (id, b) in before {
        match after.get(id) {
            Some(a) => {
                let category = classify(&a.agent);
                let delta = a.qap - b.qap;
                let kind = if category != classify(&b.agent) {
                    DiffKind::CategoryChanged
                } else {
                    DiffKind::QapChanged
                };
                if kind == DiffKind::QapChanged && delta.abs() < QAP_EPSILON {
                    continue;
                }
                diffs.push(Difference {
                    entity: *id,
                    kind,
                    category,
                    qap_delta: delta,
                });
            }
            None => diffs.push(Difference {
                entity: *id,
                kind: DiffKind::Removed,
                category: classify(&b.agent),
                qap_delta: -b.qap,
            }),
        }
    }

    for (id, a) in after {
        if !before.contains_key(id) {
            diffs.push(Difference {
                entity: *id,
                kind: DiffKind::Added,
                category: classify(&a.agent),
                qap_delta: a.qap,
            });
        }
    }

    diffs.sort_by(compare_differences);
    diffs
}

fn compare_differences(x: &Difference, y: &Difference) -> Ordering {
    y.category
        .cmp(&x.category)
        .then_with(|| y.kind.cmp(&x.kind))
        .then_with(|| y.qap_delta.abs().total_cmp(&x.qap_delta.abs()))
        .then_with(|| y.entity.cmp(&x.entity))
}

/// Count and QAP per tracked category. Members classified as Other are not summarised.
pub fn summarize(briefs: &[Brief]) -> BTreeMap<Category, Summary> {
    let mut out: BTreeMap<Category, Summary> = TRACKED_CATEGORIES
        .iter()
        .map(|c| (*c, Summary::default()))
        .collect();
    for b in briefs {
        if let Some(s) = out.get_mut(&classify(&b.agent)) {
            s.count += 1;
            s.qap += b.qap;
        }
    }
    out
}
