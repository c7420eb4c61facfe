// [tests/mirror/libs/infra/db/batch_atomicity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE ATOMICIDAD DE LOTE (V2.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: ALL-OR-NOTHING DEL UPSERT TRANSACCIONAL
 *
 * # Mathematical Proof (Snapshot Identity):
 * Una fila que viola una restricción única aborta la transacción
 * completa; el Ledger queda bit-idéntico a su snapshot previo y la
 * versión del conjunto activo no avanza.
 * =================================================================
 */

use blacklist_domain_ingest::refinery::RefinedRecord;
use blacklist_domain_models::clock::kst;
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use blacklist_infra_db::repositories::{IpRecordRepository, SystemMetadataRepository};
use blacklist_infra_db::LedgerClient;
use chrono::{NaiveDate, Utc};

fn refined(ip: &str, description: Option<&str>) -> RefinedRecord {
    let parsed: std::net::IpAddr = ip.parse().unwrap();
    RefinedRecord {
        ip: ip.to_string(),
        sort_key: blacklist_domain_models::record::numeric_sort_key(&parsed),
        earliest_detection: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        latest_detection: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        threat_level: ThreatLevel::High,
        country: None,
        description: description.map(|text| text.to_string()),
    }
}

#[tokio::test]
async fn certify_unique_violation_reverts_whole_batch() {
    println!("\n🗄️  [PROVING_GROUNDS]: Validating all-or-nothing batch semantics...");

    let database_client =
        LedgerClient::connect("file:mem_atomicity_v22?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT: memory ledger rejected");

    // Restricción única adicional inyectada para forzar la colisión.
    let connection = database_client.get_connection().unwrap();
    connection
        .execute(
            "CREATE UNIQUE INDEX idx_mirror_unique_description ON ip_records(description)",
            (),
        )
        .await
        .expect("index injection rejected");

    let repository = IpRecordRepository::new(database_client.clone());
    let system_metadata = SystemMetadataRepository::new(database_client);

    // El lote colisiona en la tercera fila (descripción duplicada).
    let poisoned_batch = vec![
        refined("1.1.1.1", Some("shared-marker")),
        refined("2.2.2.2", Some("unique-marker")),
        refined("3.3.3.3", Some("shared-marker")),
    ];

    let verdict = repository
        .upsert_batch(FeedSource::Regtech, &poisoned_batch, 90, kst())
        .await;
    assert!(verdict.is_err(), "a colliding row must abort the batch");

    // Snapshot intacto: ninguna fila del lote es visible.
    let active = repository.query_active(Utc::now(), false).await.unwrap();
    assert!(active.is_empty(), "aborted batch leaked {} rows", active.len());

    // La versión del conjunto activo tampoco avanzó.
    assert_eq!(system_metadata.active_set_version().await.unwrap(), 0);
}
