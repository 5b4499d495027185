// Dump the composite entity view as JSON (decodes multiaddr BLOBs and power TEXT).
//
// Usage: cargo run --example dump_entities -- [DB_PATH] [BEFORE]
//   DB_PATH  default: ./data/static-power.db
//   BEFORE   RFC3339 boundary, default: unbounded

use static_power::models::QueryOptions;
use static_power::record_repo::RecordRepo;
use static_power::stats::{ResolverPolicy, StatsService};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("./data/static-power.db");
    let mut opts = QueryOptions::new();
    if let Some(before) = args.get(2) {
        opts = opts.before(chrono::DateTime::parse_from_rfc3339(before)?.to_utc());
    }

    let repo = RecordRepo::connect(path, 1).await?;
    let stats = StatsService::new(Arc::new(repo), ResolverPolicy::default());
    let entities = stats.entities(&opts).await?;

    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}
