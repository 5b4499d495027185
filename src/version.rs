// Build-time version from Cargo.toml, plus the export format markers.

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// First row of a snapshot export.
pub const SNAPSHOT_CSV_VERSION: &str = "1.0";

/// First row of a diff export.
pub const DIFF_CSV_VERSION: &str = "2.0";
