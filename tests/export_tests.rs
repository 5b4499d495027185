// CSV export tests: snapshot layout, diff layout, reading snapshots back

mod common;

use common::{agent, brief, peer, power, ts};
use static_power::export::{CsvError, read_snapshot_csv, write_diff_csv, write_snapshot_csv};
use static_power::models::{Entity, EntityId};
use static_power::stats::{DiffReport, diff, index_briefs, summarize};

fn entity(id: u64, label: Option<&str>, pib: Option<u64>) -> Entity {
    Entity {
        id: EntityId(id),
        peer: Some(peer(id, "12D3KooW", &["/ip4/1.1.1.1/tcp/1", "/dns/x/tcp/2"], ts(0))),
        power: pib.map(|p| power(id, p, p, ts(0))),
        agent: label.map(|l| agent(id, l, ts(0))),
    }
}

#[test]
fn test_snapshot_csv_layout() {
    let csv = write_snapshot_csv(&[
        entity(1001, Some("venus"), Some(1)),
        entity(1002, Some("lotus"), None),
    ])
    .unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "1.0");
    assert_eq!(lines[1], "category,count,quality_adj_power");
    assert_eq!(lines[2], "venus,1,1.00000");
    assert_eq!(lines[3], "lotus,1,0.00000");
    assert_eq!(
        lines[4],
        "entity_id,peer_id,multiaddrs,agent_name,raw_byte_power,quality_adj_power"
    );
    assert_eq!(
        lines[5],
        "1001,12D3KooW,/ip4/1.1.1.1/tcp/1 /dns/x/tcp/2,venus,1125899906842624,1125899906842624"
    );
    assert_eq!(lines[6], "1002,12D3KooW,/ip4/1.1.1.1/tcp/1 /dns/x/tcp/2,lotus,,");
    assert_eq!(lines.len(), 7);
}

#[test]
fn test_snapshot_csv_reads_back_as_briefs() {
    let entities = [
        entity(1, Some("dropletv"), Some(2)),
        entity(2, Some(" lotus "), Some(3)),
        entity(3, Some("a,b \"quoted\""), Some(1)),
        entity(4, None, None),
    ];
    let briefs = read_snapshot_csv(&write_snapshot_csv(&entities).unwrap()).unwrap();
    let expected: Vec<_> = entities.iter().map(static_power::models::Brief::from_entity).collect();
    assert_eq!(briefs, expected);
    assert_eq!(briefs[1].agent, " lotus ");
    assert_eq!(briefs[3].qap, 0.0);
}

#[test]
fn test_read_snapshot_without_version_marker() {
    let text = "miner_id,peer_id,multiaddrs,agent_name,raw_byte_power,quality_adj_power\n\
                1000,p,,venus,0,1125899906842624\n";
    let briefs = read_snapshot_csv(text).unwrap();
    assert_eq!(briefs, vec![brief(1000, "venus", 1.0)]);
}

#[test]
fn test_read_snapshot_rejects_bad_input() {
    assert!(matches!(read_snapshot_csv(""), Err(CsvError::MissingHeader)));
    assert!(matches!(
        read_snapshot_csv("9.9\n"),
        Err(CsvError::UnsupportedVersion(v)) if v == "9.9"
    ));
    assert!(matches!(
        read_snapshot_csv("1.0\ncategory,count,quality_adj_power\n"),
        Err(CsvError::MissingHeader)
    ));

    let header = "entity_id,peer_id,multiaddrs,agent_name,raw_byte_power,quality_adj_power\n";
    let short = format!("{header}1000,p,,venus\n");
    assert!(matches!(
        read_snapshot_csv(&short),
        Err(CsvError::Row { line: 2, .. })
    ));
    let bad_id = format!("{header}f01000,p,,venus,1,1\n");
    assert!(matches!(
        read_snapshot_csv(&bad_id),
        Err(CsvError::Row { line: 2, .. })
    ));
    let bad_power = format!("{header}1000,p,,venus,1,1.5\n");
    assert!(matches!(
        read_snapshot_csv(&bad_power),
        Err(CsvError::Row { line: 2, .. })
    ));
}

#[test]
fn test_diff_csv_layout() {
    let before = [brief(1, "venus", 1.0), brief(2, "lotus", 2.0)];
    let after = [brief(1, "venus", 1.5), brief(3, "boost", 4.0)];
    let report = DiffReport {
        before: summarize(&before),
        after: summarize(&after),
        differences: diff(&index_briefs(&before), &index_briefs(&after)),
    };
    let csv = write_diff_csv(&report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "2.0",
            "category,count,count_diff,quality_adj_power,quality_adj_power_diff",
            "venus,1,0,1.50000,0.50000",
            "lotus,1,0,4.00000,2.00000",
            "category,diff_kind,entity_id,qap_delta",
            "venus,qap_changed,1,0.50000",
            "lotus,added,3,4.00000",
            "lotus,removed,2,-2.00000",
        ]
    );
}

#[test]
fn test_snapshot_csv_quoting_edge_cases() {
    let entities = [
        entity(1, Some("multi\nline, \"label\""), Some(1)),
        entity(2, Some("\"\""), Some(2)),
        entity(3, Some("venus\r\n"), None),
    ];
    let csv = write_snapshot_csv(&entities).unwrap();
    let briefs = read_snapshot_csv(&csv).unwrap();
    let agents: Vec<&str> = briefs.iter().map(|b| b.agent.as_str()).collect();
    assert_eq!(agents, vec!["multi\nline, \"label\"", "\"\"", "venus\r\n"]);
}

#[test]
fn test_read_snapshot_with_crlf_and_quoted_fields() {
    let text = "1.0\r\n\
                category,count,quality_adj_power\r\n\
                venus,1,1.00000\r\n\
                \r\n\
                entity_id,peer_id,multiaddrs,agent_name,raw_byte_power,quality_adj_power\r\n\
                \"1000\",p,\"/ip4/1.1.1.1/tcp/1 /dns/x/tcp/2\",\"venus, v1\",1,1125899906842624\r\n";
    let briefs = read_snapshot_csv(text).unwrap();
    assert_eq!(briefs, vec![brief(1000, "venus, v1", 1.0)]);
}
