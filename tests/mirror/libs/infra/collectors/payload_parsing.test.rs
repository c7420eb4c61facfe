// [tests/mirror/libs/infra/collectors/payload_parsing.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PARSEO DE PAYLOADS (V2.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: HTML-TABLE, HOJA DE CÁLCULO Y COERCIÓN DE FECHAS
 * =================================================================
 */

use blacklist_infra_collectors::contract::CollectorError;
use blacklist_infra_collectors::parse::{coerce_detection_date, parse_payload};
use blacklist_domain_models::threat::ThreatLevel;
use chrono::NaiveDate;

const HTML_REPORT_PAGE: &str = r#"
<html><body>
<table>
  <tr><th>IP</th><th>Detection Date</th><th>Level</th><th>Country</th></tr>
  <tr><td>1.2.3.4</td><td>2025-01-01</td><td>high</td><td>KR</td></tr>
  <tr><td>5.6.7.8</td><td>2025.01.02</td><td>medium</td><td>US</td></tr>
  <tr><td>9.9.9.9</td><td>not-a-date</td><td>low</td><td>JP</td></tr>
</table>
</body></html>
"#;

const CSV_BULLETIN: &str = "\
ip,detection_date,threat_level,country,description
203.0.113.7,2025-01-15,critical,KR,botnet controller
203.0.113.8,20250116,high,,scanner
broken-row-without-date
";

#[test]
fn certify_html_table_extraction() {
    println!("\n📡 [PROVING_GROUNDS]: Validating HTML-table extraction...");

    let parsed = parse_payload(Some("text/html; charset=utf-8"), HTML_REPORT_PAGE)
        .expect("CRITICAL_FAULT: html parse rejected");

    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.discarded, 1, "the dateless row must be discarded, never clocked");

    let first = &parsed.records[0];
    assert_eq!(first.ip_text, "1.2.3.4");
    assert_eq!(first.detection_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(first.threat_level, ThreatLevel::High);
    assert_eq!(first.country.as_deref(), Some("KR"));
}

#[test]
fn certify_spreadsheet_extraction_with_headers() {
    let parsed = parse_payload(Some("text/csv"), CSV_BULLETIN)
        .expect("CRITICAL_FAULT: csv parse rejected");

    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.discarded, 1);

    let first = &parsed.records[0];
    assert_eq!(first.ip_text, "203.0.113.7");
    assert_eq!(first.threat_level, ThreatLevel::Critical);
    assert_eq!(first.description.as_deref(), Some("botnet controller"));

    // Formato compacto YYYYMMDD también coerciona.
    assert_eq!(
        parsed.records[1].detection_date,
        NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
    );
}

#[test]
fn certify_sniffing_without_content_type() {
    // Sin Content-Type: la firma '<' despacha al motor HTML.
    let parsed = parse_payload(None, HTML_REPORT_PAGE).expect("sniffed html rejected");
    assert_eq!(parsed.records.len(), 2);

    let parsed_csv = parse_payload(None, CSV_BULLETIN).expect("sniffed csv rejected");
    assert_eq!(parsed_csv.records.len(), 2);
}

#[test]
fn certify_unrecoverable_payload_is_parse_error() {
    let hopeless = "every,row,is\nbroken,beyond,recovery\n";
    let verdict = parse_payload(Some("text/csv"), hopeless);
    assert!(matches!(verdict, Err(CollectorError::ParseError(_))));
}

#[test]
fn certify_date_coercion_formats() {
    let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    for raw_cell in ["2025-03-09", "2025.03.09", "2025/03/09", "20250309", "2025-03-09 14:22:01"] {
        assert_eq!(coerce_detection_date(raw_cell), Some(expected), "cell: {}", raw_cell);
    }
    assert_eq!(coerce_detection_date(""), None);
    assert_eq!(coerce_detection_date("yesterday"), None);
}
