// [apps/command-center/src/services/reaper.rs]
/**
 * =================================================================
 * APARATO: THE REAPER EXPIRY SWEEP (V7.1 - HYGIENE HARDENED)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: BARRIDO PERIÓDICO DE EXPIRACIÓN DEL CONJUNTO ACTIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENCE: El barrido es idempotente; un tick sin vencimientos
 *    no toca el Ledger ni la versión de caché.
 * 2. VERSION SYNC: Cuando el conjunto cambia, la versión sellada por
 *    el Ledger se adopta en el estrato de caché para invalidar a los
 *    lectores sin tormenta de borrados.
 * =================================================================
 */

use blacklist_infra_cache::TieredCache;
use blacklist_infra_db::repositories::{IpRecordRepository, SystemMetadataRepository};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Cadencia del barrido de expiración (60 segundos).
const SWEEP_INTERVAL_SECONDS: u64 = 60;

/**
 * Inicia el servicio de barrido perpetuo en el runtime de Tokio.
 *
 * @param ip_record_repository Autoridad del conjunto activo.
 * @param system_metadata Lector de la versión sellada.
 * @param cache_stratum Estrato de caché a sincronizar tras el barrido.
 */
pub async fn spawn_reaper(
    ip_record_repository: Arc<IpRecordRepository>,
    system_metadata: Arc<SystemMetadataRepository>,
    cache_stratum: Arc<TieredCache>,
) {
    let mut sweep_ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECONDS));
    sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("💀 [REAPER_ACTIVE]: Expiry sweep daemon initiated.");

        loop {
            sweep_ticker.tick().await;

            match ip_record_repository.mark_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(expired_count) => {
                    info!("💀 [REAPER_SWEEP]: Deactivated {} expired records.", expired_count);

                    // El conjunto cambió: adoptar la versión sellada por el Ledger.
                    match system_metadata.active_set_version().await {
                        Ok(sealed_version) => cache_stratum.bump_version(sealed_version),
                        Err(version_fault) => {
                            error!("💀 [REAPER_FAULT]: Version read rejected: {}", version_fault);
                        }
                    }
                }
                Err(sweep_fault) => {
                    error!("💀 [REAPER_FAULT]: Expiry sweep rejected: {}", sweep_fault);
                }
            }
        }
    });
}
