// [tests/mirror/libs/infra/db/expiry_sweep.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL BARRIDO DE EXPIRACIÓN (V2.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: LOS EXPIRADOS ABANDONAN EL CONJUNTO ACTIVO
 * =================================================================
 */

use blacklist_domain_ingest::refinery::RefinedRecord;
use blacklist_domain_models::clock::kst;
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use blacklist_infra_db::repositories::{IpRecordRepository, SystemMetadataRepository};
use blacklist_infra_db::LedgerClient;
use chrono::{Duration, NaiveDate, Utc};

fn refined_on(ip: &str, date: NaiveDate) -> RefinedRecord {
    let parsed: std::net::IpAddr = ip.parse().unwrap();
    RefinedRecord {
        ip: ip.to_string(),
        sort_key: blacklist_domain_models::record::numeric_sort_key(&parsed),
        earliest_detection: date,
        latest_detection: date,
        threat_level: ThreatLevel::Medium,
        country: None,
        description: None,
    }
}

#[tokio::test]
async fn certify_expired_records_leave_active_set() {
    println!("\n💀 [PROVING_GROUNDS]: Validating expiry sweep idempotence...");

    let database_client =
        LedgerClient::connect("file:mem_expiry_v21?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT: memory ledger rejected");
    let repository = IpRecordRepository::new(database_client.clone());
    let system_metadata = SystemMetadataRepository::new(database_client);

    let stale_date = (Utc::now() - Duration::days(10)).date_naive();
    let fresh_date = Utc::now().date_naive();

    // Retención de 1 día: el registro viejo nace ya vencido.
    repository
        .upsert_batch(
            FeedSource::Regtech,
            &[refined_on("10.0.0.1", stale_date), refined_on("10.0.0.2", fresh_date)],
            1,
            kst(),
        )
        .await
        .expect("batch rejected");
    assert_eq!(system_metadata.active_set_version().await.unwrap(), 1);

    // El filtro de vigencia ya excluye al vencido aun antes del barrido.
    let now = Utc::now();
    let pre_sweep_active = repository.query_active(now, true).await.unwrap();
    assert_eq!(pre_sweep_active.len(), 1);
    assert_eq!(pre_sweep_active[0].ip, "10.0.0.2");

    // --- BARRIDO: voltea is_active y sella versión nueva ---
    let swept = repository.mark_expired(now).await.unwrap();
    assert_eq!(swept, 1);
    assert_eq!(system_metadata.active_set_version().await.unwrap(), 2);

    let flipped = repository.get("10.0.0.1").await.unwrap();
    assert!(!flipped.is_active, "swept record must be deactivated, not deleted");

    // El registro barrido jamás reaparece en el conjunto activo.
    let post_sweep_active = repository.query_active(now, true).await.unwrap();
    assert!(post_sweep_active.iter().all(|record| record.ip != "10.0.0.1"));

    // Idempotencia: el segundo barrido no encuentra nada y no sella versión.
    assert_eq!(repository.mark_expired(now).await.unwrap(), 0);
    assert_eq!(system_metadata.active_set_version().await.unwrap(), 2);
}

#[tokio::test]
async fn certify_operator_purge_deactivates_single_address() {
    let database_client =
        LedgerClient::connect("file:mem_purge_v21?mode=memory&cache=shared", None)
            .await
            .unwrap();
    let repository = IpRecordRepository::new(database_client);

    let today = Utc::now().date_naive();
    repository
        .upsert_batch(FeedSource::Manual, &[refined_on("172.16.0.9", today)], 90, kst())
        .await
        .unwrap();

    assert!(repository.deactivate("172.16.0.9").await.unwrap());
    assert!(!repository.get("172.16.0.9").await.unwrap().is_active);

    // Purga repetida: sin efecto y sin error.
    assert!(!repository.deactivate("172.16.0.9").await.unwrap());
}
