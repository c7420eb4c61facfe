// [tests/mirror/libs/domain/ingest/refinery_canonicalization.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CANONICALIZACIÓN (V2.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: FILTRO DE FORMA, CANONICALIZACIÓN Y DEDUP INTRA-LOTE
 *
 * # Mathematical Proof (Batch Projection):
 * Para un lote B sobre un Ledger vacío, el conjunto activo resultante
 * es exactamente el subconjunto válido, canonicalizado y deduplicado
 * de B. Este test certifica esa proyección en la refinería.
 * =================================================================
 */

use blacklist_domain_ingest::refinery::{canonicalize_ip, BatchRefinery};
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::threat::ThreatLevel;
use chrono::NaiveDate;

fn window() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
    )
}

fn raw_row(ip: &str, day: u32) -> RawFeedRecord {
    RawFeedRecord {
        ip_text: ip.to_string(),
        detection_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        threat_level: ThreatLevel::Medium,
        country: None,
        description: None,
    }
}

#[test]
fn certify_rfc5952_compression_collapses_equivalent_forms() {
    println!("\n🧪 [PROVING_GROUNDS]: Validating v6 canonical collapse...");

    let refined = BatchRefinery::new(window()).refine(vec![
        raw_row("2001:0db8:0000:0000:0000:0000:0000:0001", 1),
        raw_row("2001:db8::1", 2),
        raw_row("2001:DB8::0:1", 3),
    ]);

    // Tres grafías, una sola dirección canónica.
    assert_eq!(refined.records.len(), 1);
    assert_eq!(refined.records[0].ip, "2001:db8::1");
    assert_eq!(refined.skipped_duplicate, 2);
    assert_eq!(
        refined.records[0].earliest_detection,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    );
    assert_eq!(
        refined.records[0].latest_detection,
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
    );
}

#[test]
fn certify_malformed_addresses_rejected() {
    let refined = BatchRefinery::new(window()).refine(vec![
        raw_row("999.1.2.3", 1),
        raw_row("1.2.3", 1),
        raw_row("not-an-address", 1),
        raw_row("010.1.2.3", 1), // ceros a la izquierda: malformada
        raw_row("9.9.9.9", 1),
    ]);

    assert_eq!(refined.records.len(), 1);
    assert_eq!(refined.records[0].ip, "9.9.9.9");
    assert_eq!(refined.skipped_invalid, 4);
}

#[test]
fn certify_canonicalize_ip_contract() {
    assert_eq!(
        canonicalize_ip("  203.0.113.7 ").map(|(canonical, _)| canonical),
        Some("203.0.113.7".to_string())
    );
    assert!(canonicalize_ip("300.0.0.1").is_none());
    assert!(canonicalize_ip("").is_none());

    let (_, v4_key) = canonicalize_ip("10.0.0.1").unwrap();
    assert!(v4_key.starts_with('4'));
    assert_eq!(v4_key.len(), 9);
}
