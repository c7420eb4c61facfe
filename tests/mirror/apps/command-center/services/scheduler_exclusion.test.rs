// [tests/mirror/apps/command-center/services/scheduler_exclusion.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE EXCLUSIÓN DEL CHRONOS (V2.3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: VUELO ÚNICO POR FUENTE BAJO TRIGGERS CONCURRENTES
 *
 * # Mathematical Proof (Single Flight):
 * La reserva del slot ocurre bajo cerrojo exclusivo ANTES del alta en
 * el Ledger; de dos triggers concurrentes exactamente uno gana el
 * slot y exactamente una fila de corrida existe para la ventana.
 * =================================================================
 */

use async_trait::async_trait;
use blacklist_command_center::config::{EnvCredentialFallback, SystemConfig};
use blacklist_command_center::services::chronos::{ChronosScheduler, SchedulerFault};
use blacklist_command_center::services::conduit::IngestionConduit;
use blacklist_core_vault::CredentialVault;
use blacklist_domain_models::clock::{kst, DateRange};
use blacklist_domain_models::run::RunStatus;
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_collectors::contract::{
    CancellationFlag, CollectorError, CollectorHarvest, FeedCollector, UpstreamCredentials,
};
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    IpRecordRepository, SystemMetadataRepository,
};
use blacklist_infra_db::LedgerClient;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Adaptador deliberadamente lento para mantener el slot ocupado.
struct SlowCollector;

#[async_trait]
impl FeedCollector for SlowCollector {
    fn source(&self) -> FeedSource {
        FeedSource::Regtech
    }

    async fn collect(
        &self,
        _window: DateRange,
        _credentials: &UpstreamCredentials,
        _cancellation_flag: &CancellationFlag,
    ) -> Result<CollectorHarvest, CollectorError> {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(CollectorHarvest::default())
    }
}

async fn forge_chronos(memory_url: &str) -> (Arc<ChronosScheduler>, Arc<CollectionRunRepository>, tempfile::TempDir) {
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
        regtech_fallback: EnvCredentialFallback::default(),
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

    let database_client = LedgerClient::connect(memory_url, None).await.unwrap();
    let ip_records = Arc::new(IpRecordRepository::new(database_client.clone()));
    let run_ledger = Arc::new(CollectionRunRepository::new(database_client.clone()));
    let cache = Arc::new(TieredCache::connect(None, 32, 0).await);
    let vault = Arc::new(
        CredentialVault::open(&config.vault_file_path, &config.vault_seed_path).unwrap(),
    );

    let conduit = Arc::new(IngestionConduit::new(ip_records, cache, 90, kst()));

    let mut collectors: HashMap<FeedSource, Arc<dyn FeedCollector>> = HashMap::new();
    collectors.insert(FeedSource::Regtech, Arc::new(SlowCollector));

    let chronos = ChronosScheduler::ignite(
        collectors,
        conduit,
        run_ledger.clone(),
        Arc::new(CredentialRegistryRepository::new(database_client.clone())),
        Arc::new(AuthAttemptRepository::new(database_client.clone())),
        Arc::new(SystemMetadataRepository::new(database_client)),
        vault,
        config,
    )
    .await;

    (chronos, run_ledger, vault_directory)
}

#[tokio::test]
async fn certify_concurrent_triggers_collide_with_already_running() {
    println!("\n🛡️ [PROVING_GROUNDS]: Auditing single-flight exclusion...");

    let (chronos, run_ledger, _vault_directory) =
        forge_chronos("file:mem_exclusion_v23?mode=memory&cache=shared").await;

    let window = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
    );

    // Dos triggers concurrentes para la misma fuente y ventana.
    let (first_verdict, second_verdict) = tokio::join!(
        chronos.trigger(FeedSource::Regtech, Some(window)),
        chronos.trigger(FeedSource::Regtech, Some(window)),
    );

    let verdicts = [first_verdict, second_verdict];
    let accepted: Vec<&String> = verdicts.iter().filter_map(|v| v.as_ref().ok()).collect();
    let rejected_as_duplicate = verdicts
        .iter()
        .filter(|v| matches!(v, Err(SchedulerFault::AlreadyRunning)))
        .count();

    assert_eq!(accepted.len(), 1, "exactly one trigger must win the slot");
    assert_eq!(rejected_as_duplicate, 1, "the loser must collide with already_running");

    // Exactamente una fila de corrida existe para la ventana.
    let recorded_runs = run_ledger.recent(10).await.unwrap();
    assert_eq!(recorded_runs.len(), 1);

    // Tras el sellado, el slot queda libre y un trigger nuevo procede.
    let winning_run = accepted[0].clone();
    for _ in 0..200 {
        let run = run_ledger.get(&winning_run).await.unwrap();
        if run.status.is_terminal() {
            assert_eq!(run.status, RunStatus::Success);
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    // El slot se libera justo después del sello; drena antes del trigger.
    for _ in 0..100 {
        if chronos.status_snapshot().iter().all(|view| !view.in_flight) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let follow_up = chronos.trigger(FeedSource::Regtech, Some(window)).await;
    assert!(follow_up.is_ok(), "a sealed run must release the slot");
}

#[tokio::test]
async fn certify_manual_source_has_no_adapter() {
    let (chronos, _run_ledger, _vault_directory) =
        forge_chronos("file:mem_exclusion_manual_v23?mode=memory&cache=shared").await;

    let verdict = chronos.trigger(FeedSource::Manual, None).await;
    assert!(matches!(verdict, Err(SchedulerFault::UnknownSource(_))));
}
