// CSV exports: a full snapshot (summary block + per-entity rows) and a diff report.
// Snapshot exports can be read back as briefs for offline diffing.

use std::str::FromStr;

use crate::models::{Brief, Category, Entity, EntityId, Power};
use crate::stats::{DiffReport, summarize};
use crate::version::{DIFF_CSV_VERSION, SNAPSHOT_CSV_VERSION};

const SUMMARY_HEADER: [&str; 3] = ["category", "count", "quality_adj_power"];
const DETAIL_HEADER: [&str; 6] = [
    "entity_id",
    "peer_id",
    "multiaddrs",
    "agent_name",
    "raw_byte_power",
    "quality_adj_power",
];
/// Detail header used by exports written before entities were called entities.
const LEGACY_DETAIL_FIRST_COLUMN: &str = "miner_id";
const DIFF_SUMMARY_HEADER: [&str; 5] = [
    "category",
    "count",
    "count_diff",
    "quality_adj_power",
    "quality_adj_power_diff",
];
const DIFF_HEADER: [&str; 4] = ["category", "diff_kind", "entity_id", "qap_delta"];

/// Summary rows are written in this order.
const SUMMARY_ORDER: [Category; 2] = [Category::Venus, Category::Lotus];

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("unsupported export version {0:?}")]
    UnsupportedVersion(String),
    #[error("missing entity header row")]
    MissingHeader,
    #[error("line {line}: {reason}")]
    Row { line: u64, reason: String },
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

pub fn write_snapshot_csv(entities: &[Entity]) -> Result<String, CsvError> {
    let briefs: Vec<Brief> = entities.iter().map(Brief::from_entity).collect();
    let summary = summarize(&briefs);

    let mut w = csv_writer();
    w.write_record([SNAPSHOT_CSV_VERSION])?;
    w.write_record(SUMMARY_HEADER)?;
    for category in SUMMARY_ORDER {
        let s = summary.get(&category).copied().unwrap_or_default();
        w.write_record([
            category.as_str().to_string(),
            s.count.to_string(),
            format!("{:.5}", s.qap),
        ])?;
    }

    w.write_record(DETAIL_HEADER)?;
    for e in entities {
        let (peer_id, multiaddrs) = match &e.peer {
            Some(p) => (p.peer_id.clone(), p.multiaddrs.join(" ")),
            None => (String::new(), String::new()),
        };
        let agent = e.agent.as_ref().map(|a| a.name.as_str()).unwrap_or("");
        let (raw, qap) = match &e.power {
            Some(p) => (
                p.raw_byte_power.to_string(),
                p.quality_adj_power.to_string(),
            ),
            None => (String::new(), String::new()),
        };
        w.write_record([
            e.id.to_string().as_str(),
            peer_id.as_str(),
            multiaddrs.as_str(),
            agent,
            raw.as_str(),
            qap.as_str(),
        ])?;
    }
    into_string(w)
}

pub fn write_diff_csv(report: &DiffReport) -> Result<String, CsvError> {
    let mut w = csv_writer();
    w.write_record([DIFF_CSV_VERSION])?;
    w.write_record(DIFF_SUMMARY_HEADER)?;
    for category in SUMMARY_ORDER {
        let before = report.before.get(&category).copied().unwrap_or_default();
        let after = report.after.get(&category).copied().unwrap_or_default();
        let count_diff = after.count as i64 - before.count as i64;
        w.write_record([
            category.as_str().to_string(),
            after.count.to_string(),
            count_diff.to_string(),
            format!("{:.5}", after.qap),
            format!("{:.5}", after.qap - before.qap),
        ])?;
    }

    w.write_record(DIFF_HEADER)?;
    for d in &report.differences {
        w.write_record([
            d.category.as_str().to_string(),
            d.kind.as_str().to_string(),
            d.entity.to_string(),
            format!("{:.5}", d.qap_delta),
        ])?;
    }
    into_string(w)
}

/// Parse a snapshot export back into briefs. Empty power columns read as 0 PiB.
pub fn read_snapshot_csv(text: &str) -> Result<Vec<Brief>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = reader.records();

    let first = rows.next().ok_or(CsvError::MissingHeader)??;
    if first.len() == 1 {
        if &first[0] != SNAPSHOT_CSV_VERSION {
            return Err(CsvError::UnsupportedVersion(first[0].to_string()));
        }
        // Skip the summary block up to and including the detail header.
        loop {
            match rows.next().transpose()? {
                Some(r) if is_detail_header(&r) => break,
                Some(_) => continue,
                None => return Err(CsvError::MissingHeader),
            }
        }
    } else if !is_detail_header(&first) {
        return Err(CsvError::MissingHeader);
    }

    let mut out = Vec::new();
    for r in rows {
        let r = r?;
        let line = r.position().map(|p| p.line()).unwrap_or_default();
        if r.len() != DETAIL_HEADER.len() {
            return Err(CsvError::Row {
                line,
                reason: format!("expected {} columns, got {}", DETAIL_HEADER.len(), r.len()),
            });
        }
        let id = r[0].parse::<u64>().map_err(|_| CsvError::Row {
            line,
            reason: format!("invalid entity id {:?}", &r[0]),
        })?;
        let qap = if r[5].is_empty() {
            0.0
        } else {
            Power::from_str(&r[5])
                .map_err(|e| CsvError::Row {
                    line,
                    reason: e.to_string(),
                })?
                .to_pib()
        };
        out.push(Brief {
            entity: EntityId(id),
            agent: r[3].to_string(),
            qap,
        });
    }
    Ok(out)
}

fn is_detail_header(row: &csv::StringRecord) -> bool {
    row.len() == DETAIL_HEADER.len()
        && (&row[0] == DETAIL_HEADER[0] || &row[0] == LEGACY_DETAIL_FIRST_COLUMN)
}

/// Blocks have different widths, so records are not length-checked on write.
fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn into_string(w: csv::Writer<Vec<u8>>) -> Result<String, CsvError> {
    let bytes = w
        .into_inner()
        .map_err(|e| CsvError::Csv(e.into_error().into()))?;
    // every field written was a &str
    String::from_utf8(bytes).map_err(|e| {
        CsvError::Csv(std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    })
}
