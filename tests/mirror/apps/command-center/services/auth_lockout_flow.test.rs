// [tests/mirror/apps/command-center/services/auth_lockout_flow.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL FLUJO DE CANDADO AUTH (V2.2 - E2E)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: CINCO CORRIDAS FALLIDAS → SEXTO TRIGGER BLOQUEADO
 *
 * Audita la cadena completa: el adaptador rechaza autenticación, el
 * Chronos registra el strike y degrada credential.valid; al quinto
 * strike el sexto trigger colisiona con rate_limited sin crear
 * corrida alguna.
 * =================================================================
 */

use blacklist_command_center::config::{EnvCredentialFallback, SystemConfig};
use blacklist_command_center::services::chronos::{ChronosScheduler, SchedulerFault};
use blacklist_command_center::services::conduit::IngestionConduit;
use blacklist_core_vault::CredentialVault;
use blacklist_domain_models::clock::kst;
use blacklist_domain_models::run::RunStatus;
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_collectors::contract::{CollectorError, FeedCollector};
use blacklist_infra_collectors::StubCollector;
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    IpRecordRepository, SystemMetadataRepository,
};
use blacklist_infra_db::LedgerClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn certify_five_failed_runs_lock_the_source() {
    println!("\n⛔ [PROVING_GROUNDS]: Auditing five-strikes lockout flow...");

    let vault_directory = tempfile::tempdir().unwrap();
    let config = Arc::new(SystemConfig {
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
            password: Some("wrong-secret".into()),
            bearer_token: None,
        },
        secudium_base_url: "http://127.0.0.1:0".into(),
        secudium_fallback: EnvCredentialFallback::default(),
        secudium_enabled: false,
        api_key: None,
        jwt_secret: None,
        read_endpoints_require_key: false,
        max_auth_attempts: 5,
        block_duration_hours: 1,
        vault_file_path: vault_directory.path().join("credential.vault"),
        vault_seed_path: vault_directory.path().join("vault.seed"),
    });

    let database_client =
        LedgerClient::connect("file:mem_lockout_flow_v22?mode=memory&cache=shared", None)
            .await
            .unwrap();

    let run_ledger = Arc::new(CollectionRunRepository::new(database_client.clone()));
    let credential_registry = Arc::new(CredentialRegistryRepository::new(database_client.clone()));

    // Espejo sembrado: la sonda negativa debe degradarlo a valid=false.
    credential_registry.upsert(FeedSource::Regtech, "auditor").await.unwrap();
    assert!(credential_registry.get(FeedSource::Regtech).await.unwrap().unwrap().valid);

    // Guion: cinco rechazos de autenticación consecutivos.
    let scripted_rejections: Vec<_> = (0..5)
        .map(|_| Err(CollectorError::AuthFailed("login rejected".into())))
        .collect();
    let collector = Arc::new(StubCollector::scripted(FeedSource::Regtech, scripted_rejections));

    let mut collectors: HashMap<FeedSource, Arc<dyn FeedCollector>> = HashMap::new();
    collectors.insert(FeedSource::Regtech, collector);

    let conduit = Arc::new(IngestionConduit::new(
        Arc::new(IpRecordRepository::new(database_client.clone())),
        Arc::new(TieredCache::connect(None, 32, 0).await),
        90,
        kst(),
    ));

    let chronos = ChronosScheduler::ignite(
        collectors,
        conduit,
        run_ledger.clone(),
        credential_registry.clone(),
        Arc::new(AuthAttemptRepository::new(database_client.clone())),
        Arc::new(SystemMetadataRepository::new(database_client)),
        Arc::new(CredentialVault::open(&config.vault_file_path, &config.vault_seed_path).unwrap()),
        config,
    )
    .await;

    // --- FASE 1: CINCO CORRIDAS FALLIDAS SECUENCIALES ---
    for strike_index in 1..=5 {
        let run_identifier = chronos
            .trigger(FeedSource::Regtech, None)
            .await
            .unwrap_or_else(|fault| panic!("strike {} rejected early: {}", strike_index, fault));

        let sealed = loop {
            let run = run_ledger.get(&run_identifier).await.unwrap();
            if run.status.is_terminal() {
                break run;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        };

        assert_eq!(sealed.status, RunStatus::Failed, "strike {} must fail", strike_index);
        assert_eq!(
            sealed.error_kind,
            Some(blacklist_domain_models::run::RunErrorKind::AuthFailed)
        );

        // El slot se libera justo después del sello; esperamos su drenaje.
        for _ in 0..100 {
            let snapshot = chronos.status_snapshot();
            if snapshot.iter().all(|view| !view.in_flight) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    // --- FASE 2: EL SEXTO TRIGGER COLISIONA INMEDIATAMENTE ---
    let sixth_verdict = chronos.trigger(FeedSource::Regtech, None).await;
    assert!(
        matches!(&sixth_verdict, Err(SchedulerFault::RateLimited(_))),
        "the sixth trigger must be locked out"
    );

    // Sin corrida nueva: el Ledger conserva exactamente cinco filas.
    assert_eq!(run_ledger.recent(20).await.unwrap().len(), 5);

    // --- FASE 3: LA SONDA DEGRADÓ EL ESPEJO ---
    let mirrored = credential_registry.get(FeedSource::Regtech).await.unwrap().unwrap();
    assert!(!mirrored.valid, "auth failures must flip credential.valid to false");
}
