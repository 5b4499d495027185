// StatsService tests: composite entities, snapshots, diffs and the two-hourly series

mod common;

use chrono::{TimeZone, Timelike, Utc};
use common::{agent, insert_raw_power, open_repo, peer, power, ts};
use static_power::error::Error;
use static_power::models::{Category, DiffKind, EntityId, QueryOptions, Summary};
use static_power::stats::{ResolverPolicy, StatsService, series_boundaries};

#[tokio::test]
async fn test_entities_are_composed_and_sorted() {
    let (_dir, repo) = open_repo().await;
    repo.insert_power(&power(30, 1, 2, ts(0))).await.unwrap();
    repo.insert_agent(&agent(10, "venus", ts(0))).await.unwrap();
    repo.insert_peer(&peer(10, "12D3KooW", &["/ip4/1.2.3.4/tcp/1"], ts(0)))
        .await
        .unwrap();
    repo.insert_power(&power(10, 4, 4, ts(0))).await.unwrap();
    repo.insert_agent(&agent(20, "lotus", ts(30))).await.unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let entities = stats.entities(&QueryOptions::new()).await.unwrap();
    let ids: Vec<EntityId> = entities.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![EntityId(10), EntityId(20), EntityId(30)]);

    let full = &entities[0];
    assert_eq!(full.peer.as_ref().unwrap().peer_id, "12D3KooW");
    assert_eq!(full.agent.as_ref().unwrap().name, "venus");
    assert_eq!(full.power.as_ref().unwrap().quality_adj_power.to_pib(), 4.0);
    assert!(entities[2].agent.is_none());
    assert!(entities[2].peer.is_none());

    // entity 20 has nothing before ts(10)
    let early = stats
        .entities(&QueryOptions::new().before(ts(10)))
        .await
        .unwrap();
    let ids: Vec<EntityId> = early.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![EntityId(10), EntityId(30)]);
}

#[tokio::test]
async fn test_snapshot_briefs_default_missing_fields() {
    let (_dir, repo) = open_repo().await;
    repo.insert_agent(&agent(1, "venus", ts(0))).await.unwrap();
    repo.insert_power(&power(2, 3, 3, ts(0))).await.unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let briefs = stats.snapshot(&QueryOptions::new()).await.unwrap();
    assert_eq!(briefs.len(), 2);
    assert_eq!((briefs[0].agent.as_str(), briefs[0].qap), ("venus", 0.0));
    assert_eq!((briefs[1].agent.as_str(), briefs[1].qap), ("", 3.0));
}

#[tokio::test]
async fn test_diff_requires_ordered_range() {
    let (_dir, repo) = open_repo().await;
    let stats = StatsService::new(repo, ResolverPolicy::default());

    for opts in [
        QueryOptions::new(),
        QueryOptions::new().before(ts(0)),
        QueryOptions::new().after(ts(0)),
        QueryOptions::new().before(ts(10)).after(ts(10)),
        QueryOptions::new().before(ts(20)).after(ts(10)),
    ] {
        assert!(matches!(
            stats.diff(&opts).await.unwrap_err(),
            Error::InvalidRange
        ));
    }
}

#[tokio::test]
async fn test_diff_between_two_boundaries() {
    let (_dir, repo) = open_repo().await;
    repo.save_agents(&[agent(1, "venus", ts(0)), agent(2, "lotus", ts(0))])
        .await
        .unwrap();
    repo.save_powers(&[power(1, 1, 1, ts(0)), power(2, 2, 2, ts(0))])
        .await
        .unwrap();
    repo.insert_power(&power(1, 3, 3, ts(20))).await.unwrap();
    repo.insert_agent(&agent(3, "market", ts(20))).await.unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let report = stats
        .diff(&QueryOptions::new().before(ts(10)).after(ts(30)))
        .await
        .unwrap();

    assert_eq!(report.before[&Category::Venus], Summary { count: 1, qap: 1.0 });
    assert_eq!(report.after[&Category::Venus], Summary { count: 2, qap: 3.0 });
    assert_eq!(report.after[&Category::Lotus], Summary { count: 1, qap: 2.0 });

    let kinds: Vec<(u64, DiffKind)> = report
        .differences
        .iter()
        .map(|d| (d.entity.0, d.kind))
        .collect();
    assert_eq!(kinds, vec![(3, DiffKind::Added), (1, DiffKind::QapChanged)]);
    assert_eq!(report.differences[1].qap_delta, 2.0);
}

#[tokio::test]
async fn test_static_info_excluding_capacity_only() {
    let (_dir, repo) = open_repo().await;
    repo.save_agents(&[agent(1, "venus", ts(0)), agent(2, "venus", ts(0))])
        .await
        .unwrap();
    repo.save_powers(&[power(1, 1, 1, ts(0)), power(2, 1, 10, ts(0))])
        .await
        .unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());
    let opts = QueryOptions::new().category(Category::Venus);

    let all = stats.static_info(&opts, false).await.unwrap();
    let dealt = stats.static_info(&opts, true).await.unwrap();
    assert_eq!(all.count, 2);
    assert_eq!(dealt.count, 1);
    assert_eq!(dealt.quality_adj_power, 10.0);
}

#[tokio::test]
async fn test_one_malformed_entity_fails_the_whole_call() {
    let (dir, repo) = open_repo().await;
    repo.save_agents(&[agent(1, "venus", ts(0)), agent(2, "venus", ts(0))])
        .await
        .unwrap();
    repo.insert_power(&power(1, 1, 1, ts(0))).await.unwrap();
    insert_raw_power(&dir, 2, "1x", "1", ts(0)).await;
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let err = stats.entities(&QueryOptions::new()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedPower { entity, .. } if entity == EntityId(2)));

    let err = stats.snapshot(&QueryOptions::new()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedPower { .. }));

    let venus = QueryOptions::new().category(Category::Venus);
    let err = stats.static_info(&venus, false).await.unwrap_err();
    assert!(matches!(err, Error::MalformedPower { entity, .. } if entity == EntityId(2)));
    assert!(matches!(
        stats.proportion(&QueryOptions::new()).await.unwrap_err(),
        Error::MalformedPower { .. }
    ));

    let err = stats
        .diff(&QueryOptions::new().before(ts(-10)).after(ts(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedPower { .. }));
}

#[tokio::test]
async fn test_network_power_is_served_separately() {
    let (_dir, repo) = open_repo().await;
    repo.insert_power(&power(0, 10, 12, ts(0))).await.unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let network = stats.network_power(None).await.unwrap().unwrap();
    assert_eq!(network.quality_adj_power.to_pib(), 12.0);
    assert!(stats.network_power(Some(ts(0))).await.unwrap().is_none());
    assert!(stats.entities(&QueryOptions::new()).await.unwrap().is_empty());
}

#[test]
fn test_series_boundaries_cover_a_week_on_even_hours() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
    let points = series_boundaries(now);
    assert_eq!(points.len(), 84);
    assert!(points.iter().all(|p| p.hour() % 2 == 0 && p.minute() == 0));
    assert!(points.windows(2).all(|w| w[0] - w[1] == chrono::Duration::hours(2)));
    assert_eq!(points[0], Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(points[83], Utc.with_ymd_and_hms(2024, 2, 23, 2, 0, 0).unwrap());
}

#[test]
fn test_series_boundaries_newest_may_follow_now() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 1, 30, 0).unwrap();
    let points = series_boundaries(now);
    assert_eq!(points.len(), 84);
    assert_eq!(points[0], Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap());
}

#[tokio::test]
async fn test_static_series_tracks_category_over_time() {
    let (_dir, repo) = open_repo().await;
    // ts(0) is 2024-03-01T00:00Z
    repo.insert_agent(&agent(1, "venus", ts(-600))).await.unwrap();
    repo.insert_power(&power(1, 5, 5, ts(-600))).await.unwrap();
    let stats = StatsService::new(repo, ResolverPolicy::default());

    let series = stats
        .static_series(Category::Venus, None, ts(30))
        .await
        .unwrap();
    assert_eq!(series.len(), 84);
    assert_eq!(series[0].at, ts(0));
    assert_eq!(series[0].info.quality_adj_power, 5.0);
    assert_eq!(series.last().unwrap().info.count, 0);
}
