use serde::Deserialize;

use crate::stats::ResolverPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Records older than this are purged.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u32,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily). Uses local time.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    #[serde(default = "default_vacuum_interval_secs")]
    pub vacuum_interval_secs: u64,
}

fn default_ttl_hours() -> u32 {
    7 * 24
}

fn default_purge_interval_secs() -> u64 {
    3600
}

fn default_vacuum_interval_secs() -> u64 {
    86_400
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            purge_interval_secs: default_purge_interval_secs(),
            vacuum_schedule: None,
            vacuum_interval_secs: default_vacuum_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_batch_guard_secs")]
    pub batch_guard_secs: u64,
    /// Agent labels this much older than the newest one are treated as stale.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    /// Max concurrent per-entity lookups when building a snapshot.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

fn default_batch_guard_secs() -> u64 {
    300
}

fn default_freshness_window_secs() -> u64 {
    70 * 60
}

fn default_fetch_concurrency() -> usize {
    256
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            batch_guard_secs: default_batch_guard_secs(),
            freshness_window_secs: default_freshness_window_secs(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

impl ResolverConfig {
    pub fn policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            batch_guard: chrono::Duration::seconds(self.batch_guard_secs as i64),
            freshness_window: chrono::Duration::seconds(self.freshness_window_secs as i64),
            fetch_concurrency: self.fetch_concurrency,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.retention.ttl_hours > 0,
            "retention.ttl_hours must be > 0, got {}",
            self.retention.ttl_hours
        );
        anyhow::ensure!(
            self.retention.purge_interval_secs > 0,
            "retention.purge_interval_secs must be > 0, got {}",
            self.retention.purge_interval_secs
        );
        anyhow::ensure!(
            self.retention.vacuum_interval_secs > 0,
            "retention.vacuum_interval_secs must be > 0, got {}",
            self.retention.vacuum_interval_secs
        );
        if let Some(schedule) = &self.retention.vacuum_schedule {
            anyhow::ensure!(
                <cron::Schedule as std::str::FromStr>::from_str(schedule).is_ok(),
                "retention.vacuum_schedule is not a valid cron expression: {:?}",
                schedule
            );
        }
        anyhow::ensure!(
            self.resolver.freshness_window_secs > 0,
            "resolver.freshness_window_secs must be > 0, got {}",
            self.resolver.freshness_window_secs
        );
        anyhow::ensure!(
            self.resolver.fetch_concurrency > 0,
            "resolver.fetch_concurrency must be > 0, got {}",
            self.resolver.fetch_concurrency
        );
        Ok(())
    }
}
