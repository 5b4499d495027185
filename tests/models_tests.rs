// Model tests: big-integer power values, JSON shapes, query option defaults

use static_power::models::*;
use std::str::FromStr;

#[test]
fn test_power_parses_values_beyond_u64() {
    let big = "25000000000000000000000";
    let p = Power::from_str(big).unwrap();
    assert_eq!(p.to_string(), big);
    assert!(p.to_pib() > 20_000.0);
}

#[test]
fn test_power_rejects_malformed_values() {
    for bad in ["", "-5", "+5", " 5", "5 ", "1_000", "12a", "1.5"] {
        assert!(Power::from_str(bad).is_err(), "{bad:?} should not parse");
    }
}

#[test]
fn test_power_from_pib_converts_exactly() {
    assert_eq!(Power::from_pib(3).to_pib(), 3.0);
    assert_eq!(Power::from(PIB_BYTES / 2).to_pib(), 0.5);
    assert_eq!(Power::zero().to_pib(), 0.0);
}

#[test]
fn test_power_json_is_a_string_and_accepts_numbers() {
    let p = Power::from(1000u64);
    assert_eq!(serde_json::to_string(&p).unwrap(), "\"1000\"");
    let from_str: Power = serde_json::from_str("\"1000\"").unwrap();
    let from_num: Power = serde_json::from_str("1000").unwrap();
    assert_eq!(from_str, p);
    assert_eq!(from_num, p);
    assert!(serde_json::from_str::<Power>("-1").is_err());
}

#[test]
fn test_power_json_accepts_bare_numbers_wider_than_u64() {
    // 2^65
    let p: Power = serde_json::from_str("36893488147419103232").unwrap();
    assert_eq!(p.to_string(), "36893488147419103232");
    assert_eq!(p.to_pib(), 32768.0);

    let record: PowerRecord = serde_json::from_str(
        r#"{"entity": 0, "rawBytePower": 36893488147419103232, "qualityAdjPower": 73786976294838206464}"#,
    )
    .unwrap();
    assert_eq!(record.raw_byte_power, Power::from(1u128 << 65));
    assert_eq!(record.quality_adj_power, Power::from(1u128 << 66));

    assert!(serde_json::from_str::<Power>("-36893488147419103232").is_err());
    assert!(serde_json::from_str::<Power>("1.5").is_err());
    assert!(serde_json::from_str::<Power>("1e30").is_err());
}

#[test]
fn test_power_record_json_uses_camel_case_and_defaults_timestamp() {
    let json = r#"{"entity": 1002, "rawBytePower": "1000", "qualityAdjPower": 1000}"#;
    let before = chrono::Utc::now();
    let record: PowerRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.entity, EntityId(1002));
    assert_eq!(record.raw_byte_power, Power::from(1000u64));
    assert!(record.updated_at >= before);
}

#[test]
fn test_entity_id_zero_is_network() {
    assert!(EntityId::NETWORK.is_network());
    assert!(!EntityId(1000).is_network());
    assert_eq!(EntityId(1000).to_string(), "1000");
}

#[test]
fn test_brief_from_entity_without_power_or_agent() {
    let e = Entity {
        id: EntityId(7),
        peer: None,
        power: None,
        agent: None,
    };
    let b = Brief::from_entity(&e);
    assert_eq!(b.entity, EntityId(7));
    assert_eq!(b.agent, "");
    assert_eq!(b.qap, 0.0);
}

#[test]
fn test_query_options_fold_empty_filters() {
    let opts = QueryOptions::new().tag("").category(Category::Other);
    assert_eq!(opts.tag_filter(), None);
    assert_eq!(opts.category_filter(), None);

    let opts = QueryOptions::new().tag("Japan").category(Category::Venus);
    assert_eq!(opts.tag_filter(), Some("Japan"));
    assert_eq!(opts.category_filter(), Some(Category::Venus));
}
