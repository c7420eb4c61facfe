// [tests/mirror/apps/command-center/services/trigger_pipeline.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL PIPELINE DE TRIGGER (V2.5 - E2E)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: TRIGGER → COLECTOR → CONDUCTO → LEDGER → FORMATOS
 *
 * Audita los escenarios literales del contrato de recolección:
 * génesis con fusión intra-lote, re-corrida idempotente y corrida
 * parcial por fila malformada.
 * =================================================================
 */

use blacklist_command_center::config::{EnvCredentialFallback, SystemConfig};
use blacklist_command_center::services::chronos::ChronosScheduler;
use blacklist_command_center::services::conduit::IngestionConduit;
use blacklist_core_vault::CredentialVault;
use blacklist_domain_models::clock::{date_to_instant, kst, DateRange};
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::run::{CollectionRun, RunStatus};
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_collectors::contract::FeedCollector;
use blacklist_infra_collectors::StubCollector;
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    IpRecordRepository, SystemMetadataRepository,
};
use blacklist_infra_db::LedgerClient;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// --- FORJA DEL BANCO DE PRUEBAS ---

struct ProvingRig {
    chronos: Arc<ChronosScheduler>,
    ip_records: Arc<IpRecordRepository>,
    run_ledger: Arc<CollectionRunRepository>,
    cache: Arc<TieredCache>,
    _vault_directory: tempfile::TempDir,
}

fn proving_config(vault_directory: &tempfile::TempDir) -> SystemConfig {
    SystemConfig {
        listen_port: 0,
        database_url: String::new(),
        database_auth_token: None,
        cache_url: None,
        zone_offset: kst(),
        retention_days: 90,
        collection_enabled: true,
        force_disable_collection: false,
        global_run_cap: 2,
        regtech_interval_hours: 6,
        regtech_base_url: "http://127.0.0.1:0".into(),
        regtech_fallback: EnvCredentialFallback {
            username: Some("auditor".into()),
            password: Some("proving-secret".into()),
            bearer_token: None,
        },
        secudium_base_url: "http://127.0.0.1:0".into(),
        secudium_fallback: EnvCredentialFallback::default(),
        secudium_enabled: false,
        api_key: Some("proving-key".into()),
        jwt_secret: None,
        read_endpoints_require_key: false,
        max_auth_attempts: 5,
        block_duration_hours: 1,
        vault_file_path: vault_directory.path().join("credential.vault"),
        vault_seed_path: vault_directory.path().join("vault.seed"),
    }
}

async fn forge_rig(memory_url: &str, collector: Arc<dyn FeedCollector>) -> ProvingRig {
    let vault_directory = tempfile::tempdir().expect("INFRA_FAULT: tempdir rejected");
    let config = Arc::new(proving_config(&vault_directory));

    let database_client = LedgerClient::connect(memory_url, None)
        .await
        .expect("CRITICAL_FAULT: memory ledger rejected");

    let ip_records = Arc::new(IpRecordRepository::new(database_client.clone()));
    let run_ledger = Arc::new(CollectionRunRepository::new(database_client.clone()));
    let credential_registry = Arc::new(CredentialRegistryRepository::new(database_client.clone()));
    let auth_audit = Arc::new(AuthAttemptRepository::new(database_client.clone()));
    let system_metadata = Arc::new(SystemMetadataRepository::new(database_client.clone()));

    let cache = Arc::new(TieredCache::connect(None, 128, 0).await);
    let vault = Arc::new(
        CredentialVault::open(&config.vault_file_path, &config.vault_seed_path)
            .expect("CRITICAL_FAULT: vault rejected"),
    );

    let conduit = Arc::new(IngestionConduit::new(
        ip_records.clone(),
        cache.clone(),
        config.retention_days,
        config.zone_offset,
    ));

    let mut collectors: HashMap<FeedSource, Arc<dyn FeedCollector>> = HashMap::new();
    collectors.insert(FeedSource::Regtech, collector);

    let chronos = ChronosScheduler::ignite(
        collectors,
        conduit,
        run_ledger.clone(),
        credential_registry,
        auth_audit,
        system_metadata,
        vault,
        config,
    )
    .await;

    ProvingRig {
        chronos,
        ip_records,
        run_ledger,
        cache,
        _vault_directory: vault_directory,
    }
}

async fn await_sealed(run_ledger: &CollectionRunRepository, run_identifier: &str) -> CollectionRun {
    for _ in 0..400 {
        let run = run_ledger.get(run_identifier).await.expect("run vanished");
        if run.status.is_terminal() {
            return run;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("RUN_TIMEOUT: run [{}] never sealed", run_identifier);
}

/// El slot se libera tras el sello; drena antes de un trigger consecutivo.
async fn await_slot_free(chronos: &ChronosScheduler) {
    for _ in 0..100 {
        if chronos.status_snapshot().iter().all(|view| !view.in_flight) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn scenario_window() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
    )
}

fn scenario_rows() -> Vec<RawFeedRecord> {
    vec![
        RawFeedRecord {
            ip_text: "1.2.3.4".into(),
            detection_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            threat_level: ThreatLevel::High,
            country: None,
            description: None,
        },
        RawFeedRecord {
            ip_text: "5.6.7.8".into(),
            detection_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            threat_level: ThreatLevel::Medium,
            country: None,
            description: None,
        },
        RawFeedRecord {
            ip_text: "1.2.3.4".into(),
            detection_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            threat_level: ThreatLevel::Critical,
            country: None,
            description: None,
        },
    ]
}

// --- SUITE DE AUDITORÍA ---

#[tokio::test]
async fn certify_genesis_trigger_merges_and_serves() {
    println!("\n🚀 [PROVING_GROUNDS]: Auditing genesis trigger end to end...");

    let collector = Arc::new(StubCollector::steady(FeedSource::Regtech, scenario_rows()));
    let rig = forge_rig("file:mem_trigger_genesis_v25?mode=memory&cache=shared", collector).await;

    // --- CORRIDA 1: GÉNESIS ---
    let run_identifier = rig
        .chronos
        .trigger(FeedSource::Regtech, Some(scenario_window()))
        .await
        .expect("trigger rejected");

    let sealed = await_sealed(&rig.run_ledger, &run_identifier).await;
    assert_eq!(sealed.status, RunStatus::Success);
    assert_eq!(sealed.fetched_count, 3);
    assert_eq!(sealed.inserted_count, 2);
    assert_eq!(sealed.updated_count, 0);

    // Registro fusionado: génesis inmutable, severidad suprema.
    let merged = rig.ip_records.get("1.2.3.4").await.unwrap();
    assert_eq!(merged.first_seen, date_to_instant(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), kst()));
    assert_eq!(merged.last_seen, date_to_instant(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(), kst()));
    assert_eq!(merged.threat_level, ThreatLevel::Critical);

    // El listado activo emite ambas direcciones en orden numérico.
    let active = rig.ip_records.query_active(chrono::Utc::now(), true).await.unwrap();
    let ordered: Vec<&str> = active.iter().map(|record| record.ip.as_str()).collect();
    assert_eq!(ordered, vec!["1.2.3.4", "5.6.7.8"]);

    // El commit selló versión 1 y la caché la adoptó.
    assert_eq!(rig.cache.current_version(), 1);
    await_slot_free(&rig.chronos).await;

    // --- CORRIDA 2: RE-TRIGGER IDEMPOTENTE ---
    let second_run = rig
        .chronos
        .trigger(FeedSource::Regtech, Some(scenario_window()))
        .await
        .expect("second trigger rejected");

    let second_sealed = await_sealed(&rig.run_ledger, &second_run).await;
    assert_eq!(second_sealed.status, RunStatus::Success);
    assert_eq!(second_sealed.inserted_count, 0);
    assert_eq!(second_sealed.updated_count, 2);

    // Estado del Ledger invariante bajo la re-corrida.
    let unchanged = rig.ip_records.get("1.2.3.4").await.unwrap();
    assert_eq!(unchanged.first_seen, merged.first_seen);
    assert_eq!(unchanged.threat_level, ThreatLevel::Critical);
}

#[tokio::test]
async fn certify_malformed_row_degrades_to_partial() {
    println!("\n🚀 [PROVING_GROUNDS]: Auditing partial run on malformed row...");

    let poisoned_rows = vec![
        RawFeedRecord {
            ip_text: "999.1.2.3".into(),
            detection_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            threat_level: ThreatLevel::High,
            country: None,
            description: None,
        },
        RawFeedRecord {
            ip_text: "9.9.9.9".into(),
            detection_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            threat_level: ThreatLevel::High,
            country: None,
            description: None,
        },
    ];

    let collector = Arc::new(StubCollector::steady(FeedSource::Regtech, poisoned_rows));
    let rig = forge_rig("file:mem_trigger_partial_v25?mode=memory&cache=shared", collector).await;

    let run_identifier = rig
        .chronos
        .trigger(FeedSource::Regtech, Some(scenario_window()))
        .await
        .expect("trigger rejected");

    let sealed = await_sealed(&rig.run_ledger, &run_identifier).await;
    assert_eq!(sealed.status, RunStatus::Partial);
    assert_eq!(sealed.inserted_count, 1);
    assert_eq!(
        sealed.error_kind,
        Some(blacklist_domain_models::run::RunErrorKind::ParseError)
    );

    // La dirección malformada jamás toca el conjunto activo.
    let active = rig.ip_records.query_active(chrono::Utc::now(), true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].ip, "9.9.9.9");
}
