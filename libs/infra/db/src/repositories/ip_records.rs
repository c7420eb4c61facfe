// [libs/infra/db/src/repositories/ip_records.rs]
/*!
 * =================================================================
 * APARATO: ACTIVE SET REPOSITORY (V12.4 - MERGE POLICY SEALED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: UPSERT TRANSACCIONAL Y CONSULTA DEL CONJUNTO ACTIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACID BATCH: El lote completo viaja en una transacción única; el
 *    fallo de una sola fila revierte el lote y el Ledger queda
 *    bit-idéntico a su snapshot previo.
 * 2. MERGE POLICY: select-then-merge por dirección: min(first_seen),
 *    max(last_seen), extensión de expires_at, unión del conjunto de
 *    atribución y severidad más estricta. detection_date es génesis
 *    inmutable.
 * 3. VERSION SEAL: Todo commit que altera el conjunto activo sella
 *    'active_set_version'+1 dentro de la misma transacción.
 *
 * # Mathematical Proof (Commutative Convergence):
 * Los operadores de fusión (max, unión, máximo del retículo de
 * severidad) son conmutativos y monótonos, por lo que corridas
 * concurrentes de fuentes distintas convergen al mismo estado del
 * Ledger sin importar el orden de commit.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::codec;
use crate::LedgerClient;
use blacklist_domain_ingest::refinery::RefinedRecord;
use blacklist_domain_models::clock::date_to_instant;
use blacklist_domain_models::record::IpRecord;
use blacklist_domain_models::run::UpsertStats;
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use blacklist_domain_models::analytics::DailyBucket;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use libsql::{params, Row};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Agregados del conjunto activo para el endpoint analítico.
#[derive(Debug, Clone, Default)]
pub struct ActiveSetStats {
    pub total_active: u64,
    pub by_source: BTreeMap<String, u64>,
    pub by_threat_level: BTreeMap<String, u64>,
    pub daily_detections: Vec<DailyBucket>,
}

const SELECT_RECORD_COLUMNS: &str = "
    SELECT ip, source, sources_json, detection_date, first_seen, last_seen,
           threat_level, country, description, expires_at, is_active
    FROM ip_records
";

/// Sello de versión del conjunto activo, ejecutado dentro de la transacción
/// que muta el conjunto.
const SEAL_ACTIVE_SET_VERSION: &str = "
    INSERT INTO system_metadata (key, value_int, updated_at)
    VALUES ('active_set_version', 1, CURRENT_TIMESTAMP)
    ON CONFLICT(key) DO UPDATE SET
        value_int = COALESCE(value_int, 0) + 1,
        updated_at = CURRENT_TIMESTAMP
";

/// Repositorio de autoridad única sobre el conjunto activo.
pub struct IpRecordRepository {
    database_client: LedgerClient,
}

impl IpRecordRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /**
     * Aplica un lote refinado al Ledger en una transacción única.
     *
     * Retorna las estadísticas del lote y la versión sellada del
     * conjunto activo tras el commit.
     *
     * # Errors:
     * - `DbError::TransactionError`: colapso al abrir o comprometer la
     *   secuencia atómica. La transacción abierta se revierte al caer.
     */
    #[instrument(skip(self, refined_records), fields(batch = refined_records.len()))]
    pub async fn upsert_batch(
        &self,
        run_source: FeedSource,
        refined_records: &[RefinedRecord],
        retention_days: i64,
        zone_offset: FixedOffset,
    ) -> Result<(UpsertStats, u64), DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let mut batch_stats = UpsertStats::default();

        for refined in refined_records {
            let earliest_instant = date_to_instant(refined.earliest_detection, zone_offset);
            let latest_instant = date_to_instant(refined.latest_detection, zone_offset);

            // --- FASE 1: LECTURA DEL ESTADO EXISTENTE ---
            let mut existing_rows = transaction
                .query(
                    "SELECT first_seen, last_seen, expires_at, threat_level, sources_json
                     FROM ip_records WHERE ip = ?1",
                    params![refined.ip.clone()],
                )
                .await?;

            match existing_rows.next().await? {
                Some(existing_row) => {
                    // --- FASE 2A: FUSIÓN CONMUTATIVA ---
                    // first_seen funde con min y last_seen con max; la política
                    // completa es conmutativa y el orden de commit es irrelevante.
                    let existing_first_seen =
                        codec::decode_instant(&existing_row.get::<String>(0)?)?;
                    let existing_last_seen =
                        codec::decode_instant(&existing_row.get::<String>(1)?)?;
                    let existing_expiry = existing_row
                        .get::<Option<String>>(2)?
                        .map(|raw| codec::decode_instant(&raw))
                        .transpose()?;
                    let existing_level = decode_threat(&existing_row.get::<String>(3)?);
                    let mut attribution_set =
                        decode_sources(&existing_row.get::<String>(4)?)?;

                    let merged_first_seen = existing_first_seen.min(earliest_instant);
                    let merged_last_seen = existing_last_seen.max(latest_instant);
                    let extended_expiry = merged_last_seen + Duration::days(retention_days);
                    let merged_expiry = match existing_expiry {
                        Some(previous) => previous.max(extended_expiry),
                        None => extended_expiry,
                    };
                    let merged_level = existing_level.stricter(refined.threat_level);

                    if !attribution_set.contains(&run_source) {
                        attribution_set.push(run_source);
                        attribution_set.sort();
                    }

                    transaction
                        .execute(
                            "UPDATE ip_records SET
                                first_seen = ?2,
                                last_seen = ?3,
                                expires_at = ?4,
                                threat_level = ?5,
                                sources_json = ?6,
                                country = COALESCE(country, ?7),
                                description = COALESCE(description, ?8),
                                is_active = 1,
                                updated_at = CURRENT_TIMESTAMP
                             WHERE ip = ?1",
                            params![
                                refined.ip.clone(),
                                codec::encode_instant(merged_first_seen),
                                codec::encode_instant(merged_last_seen),
                                codec::encode_instant(merged_expiry),
                                merged_level.as_str(),
                                encode_sources(&attribution_set),
                                refined.country.clone(),
                                refined.description.clone()
                            ],
                        )
                        .await?;

                    batch_stats.updated += 1;
                }
                None => {
                    // --- FASE 2B: ALTA DE GÉNESIS ---
                    let genesis_expiry = latest_instant + Duration::days(retention_days);

                    transaction
                        .execute(
                            "INSERT INTO ip_records
                                (ip, sort_key, source, sources_json, detection_date,
                                 first_seen, last_seen, threat_level, country,
                                 description, expires_at, is_active)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)",
                            params![
                                refined.ip.clone(),
                                refined.sort_key.clone(),
                                run_source.as_str(),
                                encode_sources(&[run_source]),
                                codec::encode_date(refined.earliest_detection),
                                codec::encode_instant(earliest_instant),
                                codec::encode_instant(latest_instant),
                                refined.threat_level.as_str(),
                                refined.country.clone(),
                                refined.description.clone(),
                                codec::encode_instant(genesis_expiry)
                            ],
                        )
                        .await?;

                    batch_stats.inserted += 1;
                }
            }
        }

        // --- FASE 3: SELLADO DE VERSIÓN DEL CONJUNTO ACTIVO ---
        transaction.execute(SEAL_ACTIVE_SET_VERSION, ()).await?;

        let mut version_rows = transaction
            .query(
                "SELECT value_int FROM system_metadata WHERE key = 'active_set_version'",
                (),
            )
            .await?;
        let sealed_version: u64 = version_rows
            .next()
            .await?
            .and_then(|row| row.get::<i64>(0).ok())
            .unwrap_or(0) as u64;

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "📥 [ACTIVE_SET]: Batch committed. inserted={} updated={} version={}",
            batch_stats.inserted, batch_stats.updated, sealed_version
        );

        Ok((batch_stats, sealed_version))
    }

    /// Conjunto activo frente al instante dado. El orden numérico se
    /// materializa vía la llave de orden cuando se solicita.
    #[instrument(skip(self))]
    pub async fn query_active(
        &self,
        observation_instant: DateTime<Utc>,
        numeric_order: bool,
    ) -> Result<Vec<IpRecord>, DbError> {
        let connection = self.database_client.get_connection()?;

        let statement = if numeric_order {
            format!(
                "{SELECT_RECORD_COLUMNS}
                 WHERE is_active = 1 AND (expires_at IS NULL OR expires_at > ?1)
                 ORDER BY sort_key ASC"
            )
        } else {
            format!(
                "{SELECT_RECORD_COLUMNS}
                 WHERE is_active = 1 AND (expires_at IS NULL OR expires_at > ?1)"
            )
        };

        let mut query_rows = connection
            .query(&statement, params![codec::encode_instant(observation_instant)])
            .await?;

        let mut active_records = Vec::new();
        while let Some(data_row) = query_rows.next().await? {
            active_records.push(map_row_to_record(&data_row)?);
        }
        Ok(active_records)
    }

    /// Registros atribuidos a una fuente, opcionalmente desde una fecha.
    #[instrument(skip(self))]
    pub async fn query_by_source(
        &self,
        source: FeedSource,
        since: Option<NaiveDate>,
    ) -> Result<Vec<IpRecord>, DbError> {
        let connection = self.database_client.get_connection()?;

        let since_floor = since
            .map(codec::encode_date)
            .unwrap_or_else(|| "0000-00-00".to_string());

        let statement = format!(
            "{SELECT_RECORD_COLUMNS}
             WHERE sources_json LIKE ?1 AND detection_date >= ?2
             ORDER BY sort_key ASC"
        );

        let mut query_rows = connection
            .query(
                &statement,
                params![format!("%\"{}\"%", source.as_str()), since_floor],
            )
            .await?;

        let mut attributed_records = Vec::new();
        while let Some(data_row) = query_rows.next().await? {
            attributed_records.push(map_row_to_record(&data_row)?);
        }
        Ok(attributed_records)
    }

    /// Recupera un registro puntual por dirección canónica.
    pub async fn get(&self, ip: &str) -> Result<IpRecord, DbError> {
        let connection = self.database_client.get_connection()?;
        let statement = format!("{SELECT_RECORD_COLUMNS} WHERE ip = ?1");

        let mut query_rows = connection.query(&statement, params![ip]).await?;
        match query_rows.next().await? {
            Some(data_row) => map_row_to_record(&data_row),
            None => Err(DbError::RecordNotFound),
        }
    }

    /**
     * Barrido de expiración: desactiva registros con expires_at vencido.
     * Idempotente; sella versión nueva solo si el conjunto cambió.
     */
    #[instrument(skip(self))]
    pub async fn mark_expired(&self, observation_instant: DateTime<Utc>) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let expired_count = transaction
            .execute(
                "UPDATE ip_records SET is_active = 0, updated_at = CURRENT_TIMESTAMP
                 WHERE is_active = 1 AND expires_at IS NOT NULL AND expires_at <= ?1",
                params![codec::encode_instant(observation_instant)],
            )
            .await?;

        if expired_count > 0 {
            transaction.execute(SEAL_ACTIVE_SET_VERSION, ()).await?;
        }

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        if expired_count > 0 {
            info!("💀 [EXPIRY_SWEEP]: Deactivated {} expired records.", expired_count);
        }
        Ok(expired_count)
    }

    /// Purga de operador: desactiva una dirección puntual sin borrarla.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, ip: &str) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let flipped_count = transaction
            .execute(
                "UPDATE ip_records SET is_active = 0, updated_at = CURRENT_TIMESTAMP
                 WHERE ip = ?1 AND is_active = 1",
                params![ip],
            )
            .await?;

        if flipped_count > 0 {
            transaction.execute(SEAL_ACTIVE_SET_VERSION, ()).await?;
        }

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        Ok(flipped_count > 0)
    }

    /// Agregados del conjunto activo sobre una ventana de días.
    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        window_days: i64,
        zone_offset: FixedOffset,
    ) -> Result<ActiveSetStats, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut aggregated = ActiveSetStats::default();

        let mut source_rows = connection
            .query(
                "SELECT source, COUNT(*) FROM ip_records WHERE is_active = 1 GROUP BY source",
                (),
            )
            .await?;
        while let Some(data_row) = source_rows.next().await? {
            let source_label: String = data_row.get(0)?;
            let bucket_count: i64 = data_row.get(1)?;
            aggregated.total_active += bucket_count as u64;
            aggregated.by_source.insert(source_label, bucket_count as u64);
        }

        let mut level_rows = connection
            .query(
                "SELECT threat_level, COUNT(*) FROM ip_records WHERE is_active = 1 GROUP BY threat_level",
                (),
            )
            .await?;
        while let Some(data_row) = level_rows.next().await? {
            let level_label: String = data_row.get(0)?;
            let bucket_count: i64 = data_row.get(1)?;
            aggregated
                .by_threat_level
                .insert(level_label, bucket_count as u64);
        }

        let window_floor = blacklist_domain_models::clock::today_in(zone_offset)
            - Duration::days(window_days);

        let mut daily_rows = connection
            .query(
                "SELECT detection_date, COUNT(*) FROM ip_records
                 WHERE detection_date >= ?1
                 GROUP BY detection_date ORDER BY detection_date ASC",
                params![codec::encode_date(window_floor)],
            )
            .await?;
        while let Some(data_row) = daily_rows.next().await? {
            let day = codec::decode_date(&data_row.get::<String>(0)?)?;
            let bucket_count: i64 = data_row.get(1)?;
            aggregated.daily_detections.push(DailyBucket {
                day,
                count: bucket_count as u64,
            });
        }

        Ok(aggregated)
    }
}

// --- ESTRATO PRIVADO: MAPEO FILA → DOMINIO ---

fn map_row_to_record(data_row: &Row) -> Result<IpRecord, DbError> {
    let source_label: String = data_row.get(1)?;
    let source = FeedSource::parse(&source_label)
        .ok_or_else(|| DbError::MappingError(format!("SOURCE_UNKNOWN [{}]", source_label)))?;

    Ok(IpRecord {
        ip: data_row.get(0)?,
        source,
        sources: decode_sources(&data_row.get::<String>(2)?)?,
        detection_date: codec::decode_date(&data_row.get::<String>(3)?)?,
        first_seen: codec::decode_instant(&data_row.get::<String>(4)?)?,
        last_seen: codec::decode_instant(&data_row.get::<String>(5)?)?,
        threat_level: decode_threat(&data_row.get::<String>(6)?),
        country: data_row.get::<Option<String>>(7)?,
        description: data_row.get::<Option<String>>(8)?,
        expires_at: data_row
            .get::<Option<String>>(9)?
            .map(|raw| codec::decode_instant(&raw))
            .transpose()?,
        is_active: data_row.get::<i64>(10)? != 0,
    })
}

fn decode_threat(raw_level: &str) -> ThreatLevel {
    ThreatLevel::coerce(raw_level)
}

fn decode_sources(raw_json: &str) -> Result<Vec<FeedSource>, DbError> {
    serde_json::from_str(raw_json)
        .map_err(|fault| DbError::MappingError(format!("ATTRIBUTION_SET_MALFORMED: {}", fault)))
}

fn encode_sources(attribution_set: &[FeedSource]) -> String {
    serde_json::to_string(attribution_set).unwrap_or_else(|_| "[]".to_string())
}
