// Offline diff of two snapshot exports.
//
// Usage: snapshot-diff <before.csv> <after.csv>
//   Prints the diff report (same layout as GET /api/v0/diff/csv) to stdout.

use static_power::export::{read_snapshot_csv, write_diff_csv};
use static_power::stats::{DiffReport, diff, index_briefs, summarize};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let (Some(before_path), Some(after_path)) = (args.get(1), args.get(2)) else {
        anyhow::bail!("usage: snapshot-diff <before.csv> <after.csv>");
    };

    let before = read_snapshot_csv(&std::fs::read_to_string(before_path)?)
        .map_err(|e| anyhow::anyhow!("{}: {}", before_path, e))?;
    let after = read_snapshot_csv(&std::fs::read_to_string(after_path)?)
        .map_err(|e| anyhow::anyhow!("{}: {}", after_path, e))?;

    let report = DiffReport {
        before: summarize(&before),
        after: summarize(&after),
        differences: diff(&index_briefs(&before), &index_briefs(&after)),
    };
    print!("{}", write_diff_csv(&report)?);
    Ok(())
}
