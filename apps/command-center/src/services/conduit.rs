// [apps/command-center/src/services/conduit.rs]
/*!
 * =================================================================
 * APARATO: INGESTION CONDUIT (V7.1 - REFINERY TO LEDGER)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACIÓN REFINERÍA → LEDGER → CACHÉ
 *
 * # Mathematical Proof (Atomic Visibility):
 * La cosecha cruda se refina en memoria y viaja al Ledger en una
 * transacción única; el bump de versión de caché ocurre tras el
 * commit. Un lector jamás observa efectos parciales del lote.
 * =================================================================
 */

use blacklist_domain_ingest::refinery::BatchRefinery;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::run::UpsertStats;
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_cache::TieredCache;
use blacklist_infra_db::repositories::IpRecordRepository;
use blacklist_infra_db::DbError;
use chrono::FixedOffset;
use std::sync::Arc;
use tracing::{info, instrument};

/// Conducto único entre la cosecha de un adaptador y el conjunto activo.
pub struct IngestionConduit {
    ip_record_repository: Arc<IpRecordRepository>,
    cache_stratum: Arc<TieredCache>,
    retention_days: i64,
    zone_offset: FixedOffset,
}

impl IngestionConduit {
    pub fn new(
        ip_record_repository: Arc<IpRecordRepository>,
        cache_stratum: Arc<TieredCache>,
        retention_days: i64,
        zone_offset: FixedOffset,
    ) -> Self {
        Self {
            ip_record_repository,
            cache_stratum,
            retention_days,
            zone_offset,
        }
    }

    /**
     * Ejecuta el pipeline de ingesta completo sobre un lote crudo.
     *
     * Un lote sin filas válidas retorna estadísticas de descarte sin
     * tocar el Ledger ni la versión de caché.
     */
    #[instrument(skip(self, raw_batch), fields(source = %source, rows = raw_batch.len()))]
    pub async fn ingest(
        &self,
        source: FeedSource,
        window: DateRange,
        raw_batch: Vec<RawFeedRecord>,
    ) -> Result<UpsertStats, DbError> {
        // --- FASES 1-3: REFINERÍA EN MEMORIA ---
        let refined_batch = BatchRefinery::new(window).refine(raw_batch);

        let mut conduit_stats = UpsertStats {
            skipped_invalid: refined_batch.skipped_invalid,
            skipped_duplicate: refined_batch.skipped_duplicate,
            ..UpsertStats::default()
        };

        if refined_batch.records.is_empty() {
            info!("📭 [CONDUIT]: Batch refined to zero rows. Ledger untouched.");
            return Ok(conduit_stats);
        }

        // --- FASES 4-5: TRANSACCIÓN ÚNICA + SELLADO DE VERSIÓN ---
        let (transaction_stats, sealed_version) = self
            .ip_record_repository
            .upsert_batch(
                source,
                &refined_batch.records,
                self.retention_days,
                self.zone_offset,
            )
            .await?;

        conduit_stats.absorb(transaction_stats);

        // --- FASE 5B: INVALIDACIÓN COMPACTA (BUMP DE VERSIÓN) ---
        self.cache_stratum.bump_version(sealed_version);

        Ok(conduit_stats)
    }
}
