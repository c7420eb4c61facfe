// [apps/command-center/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V7.2 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, CACHÉ Y CHRONOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: El grafo de colaboradores se cablea una sola
 *    vez en el Kernel; los handlers reciben este estado como
 *    parámetro y jamás tocan singletons globales.
 * 2. NOMINAL PURITY: Erradicación total de abreviaciones. Uso de
 *    'Arc<T>' para inmutabilidad compartida.
 * =================================================================
 */

use crate::config::SystemConfig;
use crate::services::chronos::ChronosScheduler;
use crate::services::conduit::IngestionConduit;
use blacklist_core_vault::CredentialVault;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    IpRecordRepository, SystemMetadataRepository,
};
use blacklist_infra_db::LedgerClient;
use std::sync::Arc;

/**
 * Contenedor de estado compartido (Thread-Safe) del Centro de Mando.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Cliente del Ledger (libSQL local o Turso Cloud).
    pub database_client: LedgerClient,
    /// Estrato de lectura de dos niveles.
    pub cache_stratum: Arc<TieredCache>,
    /// Bóveda cifrada de credenciales upstream.
    pub credential_vault: Arc<CredentialVault>,
    /// Autoridad única de despacho de corridas.
    pub chronos: Arc<ChronosScheduler>,
    /// Conducto refinería → Ledger → caché (altas manuales incluidas).
    pub ingestion_conduit: Arc<IngestionConduit>,
    /// Captura tipada del entorno.
    pub config: Arc<SystemConfig>,

    // --- REPOSITORIOS DE AUTORIDAD ---
    pub ip_record_repository: Arc<IpRecordRepository>,
    pub run_ledger: Arc<CollectionRunRepository>,
    pub credential_registry: Arc<CredentialRegistryRepository>,
    pub auth_audit: Arc<AuthAttemptRepository>,
    pub system_metadata: Arc<SystemMetadataRepository>,
}

impl AppState {
    /**
     * Forja el estado maestro con el grafo de colaboradores ya armado.
     * El Kernel es el único llamador.
     */
    #[allow(clippy::too_many_arguments)]
    pub fn forge(
        database_client: LedgerClient,
        cache_stratum: Arc<TieredCache>,
        credential_vault: Arc<CredentialVault>,
        chronos: Arc<ChronosScheduler>,
        ingestion_conduit: Arc<IngestionConduit>,
        config: Arc<SystemConfig>,
        ip_record_repository: Arc<IpRecordRepository>,
        run_ledger: Arc<CollectionRunRepository>,
        credential_registry: Arc<CredentialRegistryRepository>,
        auth_audit: Arc<AuthAttemptRepository>,
        system_metadata: Arc<SystemMetadataRepository>,
    ) -> Self {
        Self {
            database_client,
            cache_stratum,
            credential_vault,
            chronos,
            ingestion_conduit,
            config,
            ip_record_repository,
            run_ledger,
            credential_registry,
            auth_audit,
            system_metadata,
        }
    }
}
