// [tests/mirror/apps/command-center/handlers/serving_formats.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE FORMATOS DE SALIDA (V2.3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: LISTADO PLANO Y SOBRE FORTIGATE (PARIDAD CANÓNICA)
 *
 * # Mathematical Proof (Formatter Parity):
 * Ambos formateadores proyectan el mismo snapshot del conjunto
 * activo; toda dirección del listado plano aparece con idéntica
 * forma canónica en las entradas FortiGate.
 * =================================================================
 */

use blacklist_command_center::handlers::blacklist::{build_fortigate_envelope, render_plain_list};
use blacklist_domain_models::clock::kst;
use blacklist_domain_models::record::IpRecord;
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use chrono::{Duration, TimeZone, Utc};

fn active_record(ip: &str, lifetime_hours: i64) -> IpRecord {
    let anchor = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    IpRecord {
        ip: ip.to_string(),
        source: FeedSource::Regtech,
        sources: vec![FeedSource::Regtech],
        detection_date: anchor.date_naive(),
        first_seen: anchor,
        last_seen: anchor,
        threat_level: ThreatLevel::High,
        country: None,
        description: None,
        expires_at: Some(anchor + Duration::hours(lifetime_hours)),
        is_active: true,
    }
}

#[test]
fn certify_plain_list_contract() {
    println!("\n📄 [PROVING_GROUNDS]: Validating plain list contract...");

    let snapshot = vec![active_record("1.2.3.4", 48), active_record("5.6.7.8", 24)];
    let rendered = render_plain_list(&snapshot, 3, Utc::now(), kst());

    // Las líneas de metadatos portan '#'; las direcciones viajan desnudas.
    let (comment_lines, address_lines): (Vec<&str>, Vec<&str>) = rendered
        .lines()
        .partition(|line| line.starts_with('#'));

    assert!(comment_lines.iter().any(|line| line.contains("active_set_version: 3")));
    assert!(comment_lines.iter().any(|line| line.contains("count: 2")));
    assert_eq!(address_lines, vec!["1.2.3.4", "5.6.7.8"]);
}

#[test]
fn certify_fortigate_envelope_minimum_lifetime() {
    let observation = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let snapshot = vec![active_record("1.2.3.4", 48), active_record("5.6.7.8", 24)];

    let envelope = build_fortigate_envelope(&snapshot, 3, observation, kst());

    assert_eq!(envelope.version, "3");
    assert_eq!(envelope.entries.len(), 2);
    // ttl = mínimo de vida restante: 24 horas.
    assert_eq!(envelope.ttl_seconds, 24 * 3600);
    assert!(envelope.ttl_seconds >= 0);
}

#[test]
fn certify_fortigate_empty_set_is_non_negative() {
    let envelope = build_fortigate_envelope(&[], 0, Utc::now(), kst());
    assert_eq!(envelope.entries.len(), 0);
    assert_eq!(envelope.ttl_seconds, 0);
}

#[test]
fn certify_formatter_parity_roundtrip() {
    let snapshot = vec![
        active_record("203.0.113.7", 10),
        active_record("2001:db8::1", 20),
        active_record("10.0.0.1", 30),
    ];

    let observation = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let rendered = render_plain_list(&snapshot, 1, observation, kst());
    let envelope = build_fortigate_envelope(&snapshot, 1, observation, kst());

    // Toda dirección del listado plano aparece idéntica en FortiGate.
    let plain_addresses: Vec<&str> = rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect();
    let fortigate_addresses: Vec<&str> =
        envelope.entries.iter().map(|entry| entry.ip.as_str()).collect();

    assert_eq!(plain_addresses, fortigate_addresses);

    // Una dirección ya pasada por el formato se re-parsea a la misma forma.
    for address in plain_addresses {
        let reparsed: std::net::IpAddr = address.parse().expect("formatter emitted invalid ip");
        assert_eq!(reparsed.to_string(), address);
    }
}
