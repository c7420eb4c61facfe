// [apps/command-center/src/kernel.rs]
/**
 * =================================================================
 * APARATO: COMMAND CENTER SOVEREIGN KERNEL (V9.1 - EXIT CONTRACT)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios.
 * El contrato de salida es estricto: una Bóveda corrupta (2) o un
 * Ledger inalcanzable (3) rehúsan el arranque antes de abrir el
 * socket TCP; la configuración inválida (1) colapsa aún antes.
 * =================================================================
 */

use crate::config::{ConfigFault, SystemConfig};
use crate::routes::create_command_router;
use crate::services::chronos::ChronosScheduler;
use crate::services::conduit::IngestionConduit;
use crate::services::reaper::spawn_reaper;
use crate::state::AppState;
use blacklist_core_vault::{CredentialVault, VaultError};
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_cache::tiered::DEFAULT_FALLBACK_ENTRY_CEILING;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_collectors::contract::FeedCollector;
use blacklist_infra_collectors::{RegtechCollector, SecudiumCollector};
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    IpRecordRepository, SystemMetadataRepository,
};
use blacklist_infra_db::{DbError, LedgerClient};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Fallos de ignición mapeados al contrato de códigos de salida.
#[derive(Error, Debug)]
pub enum IgnitionFault {
    #[error("CONFIG_IGNITION_FAULT: {0}")]
    Config(#[from] ConfigFault),

    #[error("VAULT_IGNITION_FAULT: {0}")]
    Vault(#[from] VaultError),

    #[error("STORE_IGNITION_FAULT: {0}")]
    Store(#[from] DbError),
}

impl IgnitionFault {
    /// Contrato: 1 configuración, 2 bóveda corrupta, 3 Ledger inalcanzable.
    pub fn exit_code(&self) -> i32 {
        match self {
            IgnitionFault::Config(_) => 1,
            IgnitionFault::Vault(_) => 2,
            IgnitionFault::Store(_) => 3,
        }
    }
}

pub struct CommandCenterKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl CommandCenterKernel {
    /**
     * Realiza la ignición completa del grafo de colaboradores.
     * La Bóveda abre antes que el Ledger: una corrupción criptográfica
     * debe rehusar el arranque sin tocar la red.
     */
    pub async fn ignite(config: SystemConfig) -> Result<Self, IgnitionFault> {
        let config = Arc::new(config);

        // --- 1. BÓVEDA DE CREDENCIALES (FAIL-CLOSED) ---
        let credential_vault = Arc::new(CredentialVault::open(
            &config.vault_file_path,
            &config.vault_seed_path,
        )?);

        // --- 2. LEDGER TÁCTICO ---
        // Los despliegues locales usan 'file:...'; el directorio debe existir
        // antes de que el driver intente crear el archivo.
        if let Some(local_database_path) = config.database_url.strip_prefix("file:") {
            let bare_path = local_database_path.split('?').next().unwrap_or(local_database_path);
            if let Some(parent_directory) = std::path::Path::new(bare_path).parent() {
                let _ = std::fs::create_dir_all(parent_directory);
            }
        }

        let database_client = LedgerClient::connect(
            &config.database_url,
            config.database_auth_token.clone(),
        )
        .await?;

        let ip_record_repository = Arc::new(IpRecordRepository::new(database_client.clone()));
        let run_ledger = Arc::new(CollectionRunRepository::new(database_client.clone()));
        let credential_registry =
            Arc::new(CredentialRegistryRepository::new(database_client.clone()));
        let auth_audit = Arc::new(AuthAttemptRepository::new(database_client.clone()));
        let system_metadata = Arc::new(SystemMetadataRepository::new(database_client.clone()));

        // --- 3. ESTRATO DE CACHÉ (VERSIÓN HIDRATADA DEL LEDGER) ---
        let sealed_version = system_metadata.active_set_version().await?;
        let cache_stratum = Arc::new(
            TieredCache::connect(
                config.cache_url.as_deref(),
                DEFAULT_FALLBACK_ENTRY_CEILING,
                sealed_version,
            )
            .await,
        );

        if let Err(seal_fault) = system_metadata
            .seal_vault_key_version(credential_vault.key_version())
            .await
        {
            warn!("⚠️ [KERNEL]: Vault key version seal rejected: {}", seal_fault);
        }

        // --- 4. CONDUCTO DE INGESTA Y ADAPTADORES ---
        let ingestion_conduit = Arc::new(IngestionConduit::new(
            ip_record_repository.clone(),
            cache_stratum.clone(),
            config.retention_days,
            config.zone_offset,
        ));

        let mut collectors: HashMap<FeedSource, Arc<dyn FeedCollector>> = HashMap::new();
        collectors.insert(
            FeedSource::Regtech,
            Arc::new(RegtechCollector::new(config.regtech_base_url.clone())),
        );
        collectors.insert(
            FeedSource::Secudium,
            Arc::new(SecudiumCollector::new(
                config.secudium_base_url.clone(),
                config.secudium_enabled,
            )),
        );

        // --- 5. CHRONOS (AUTORIDAD DE DESPACHO) ---
        let chronos = ChronosScheduler::ignite(
            collectors,
            ingestion_conduit.clone(),
            run_ledger.clone(),
            credential_registry.clone(),
            auth_audit.clone(),
            system_metadata.clone(),
            credential_vault.clone(),
            config.clone(),
        )
        .await;

        let application_shared_state = AppState::forge(
            database_client,
            cache_stratum,
            credential_vault,
            chronos,
            ingestion_conduit,
            config.clone(),
            ip_record_repository,
            run_ledger,
            credential_registry,
            auth_audit,
            system_metadata,
        );

        Ok(Self {
            server_network_port: config.listen_port,
            application_shared_state,
        })
    }

    /**
     * Lanza los daemons autónomos y el servidor HTTP principal.
     */
    pub async fn launch_operations(self) {
        let shared_state = self.application_shared_state.clone();

        // --- 1. MARCAPASOS DEL CHRONOS (AGENDA PERIÓDICA) ---
        shared_state.chronos.clone().spawn_pacemaker().await;

        // --- 2. REAPER (BARRIDO DE EXPIRACIÓN) ---
        spawn_reaper(
            shared_state.ip_record_repository.clone(),
            shared_state.system_metadata.clone(),
            shared_state.cache_stratum.clone(),
        )
        .await;

        // --- 3. IGNICIÓN DEL TRANSPORTE HTTP (AXUM) ---
        let command_router = create_command_router(shared_state);

        let bind_address = SocketAddr::new(
            "0.0.0.0".parse::<IpAddr>().unwrap(),
            self.server_network_port,
        );

        info!("🚀 [KERNEL_ONLINE]: Command Center listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, command_router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
