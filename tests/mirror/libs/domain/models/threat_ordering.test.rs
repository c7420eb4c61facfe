// [tests/mirror/libs/domain/models/threat_ordering.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL RETÍCULO DE SEVERIDAD (V2.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: ORDEN TOTAL, COERCIÓN Y LLAVES DE ORDEN NUMÉRICO
 * =================================================================
 */

use blacklist_domain_models::record::numeric_sort_key;
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use std::net::IpAddr;

#[test]
fn certify_threat_lattice_total_order() {
    println!("\n🧪 [PROVING_GROUNDS]: Validating severity lattice...");

    assert!(ThreatLevel::Unknown < ThreatLevel::Low);
    assert!(ThreatLevel::Low < ThreatLevel::Medium);
    assert!(ThreatLevel::Medium < ThreatLevel::High);
    assert!(ThreatLevel::High < ThreatLevel::Critical);

    // El operador de fusión es max: conmutativo e idempotente.
    assert_eq!(
        ThreatLevel::High.stricter(ThreatLevel::Medium),
        ThreatLevel::Medium.stricter(ThreatLevel::High)
    );
    assert_eq!(ThreatLevel::Critical.stricter(ThreatLevel::Critical), ThreatLevel::Critical);
}

#[test]
fn certify_threat_coercion_degrades_to_unknown() {
    assert_eq!(ThreatLevel::coerce("HIGH"), ThreatLevel::High);
    assert_eq!(ThreatLevel::coerce(" critical "), ThreatLevel::Critical);
    assert_eq!(ThreatLevel::coerce("definitely-not-a-level"), ThreatLevel::Unknown);
    assert_eq!(ThreatLevel::coerce(""), ThreatLevel::Unknown);
}

#[test]
fn certify_numeric_sort_key_orders_v4_before_v6() {
    let low_v4: IpAddr = "2.0.0.1".parse().unwrap();
    let high_v4: IpAddr = "192.168.0.9".parse().unwrap();
    let any_v6: IpAddr = "2001:db8::1".parse().unwrap();

    let low_key = numeric_sort_key(&low_v4);
    let high_key = numeric_sort_key(&high_v4);
    let v6_key = numeric_sort_key(&any_v6);

    assert!(low_key < high_key, "numeric order must beat lexicographic order");
    assert!(high_key < v6_key, "v4 strata precede v6 strata");
}

#[test]
fn certify_source_identifiers_roundtrip() {
    for source in [FeedSource::Regtech, FeedSource::Secudium, FeedSource::Manual] {
        assert_eq!(FeedSource::parse(source.as_str()), Some(source));
    }
    assert_eq!(FeedSource::parse("REGTECH"), Some(FeedSource::Regtech));
    assert_eq!(FeedSource::parse("unknown-upstream"), None);
}
