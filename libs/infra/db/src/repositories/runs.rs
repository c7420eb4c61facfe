// [libs/infra/db/src/repositories/runs.rs]
/*!
 * =================================================================
 * APARATO: COLLECTION RUN LEDGER REPOSITORY (V12.2 - SINGLE SEAL)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: BITÁCORA APPEND-ONLY DE CORRIDAS DE RECOLECCIÓN
 *
 * # Mathematical Proof (Single Seal):
 * El sellado exige 'finished_at IS NULL' en el predicado del UPDATE.
 * El motor garantiza atomicidad por sentencia, por lo que exactamente
 * una transición puede estampar finished_at; cualquier reintento
 * colisiona con RunAlreadySealed.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::codec;
use crate::LedgerClient;
use blacklist_domain_models::run::{CollectionRun, RunErrorKind, RunStatus, UpsertStats};
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::clock::DateRange;
use chrono::Utc;
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;

const SELECT_RUN_COLUMNS: &str = "
    SELECT id, source, status, started_at, finished_at,
           fetched_count, inserted_count, updated_count, error_kind, error_detail
    FROM collection_runs
";

/// Repositorio del Ledger de corridas.
pub struct CollectionRunRepository {
    database_client: LedgerClient,
}

impl CollectionRunRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /// Alta de una corrida en estado 'pending'. Retorna su identificador.
    #[instrument(skip(self))]
    pub async fn create_pending(
        &self,
        source: FeedSource,
        window: DateRange,
    ) -> Result<String, DbError> {
        let run_identifier = Uuid::new_v4().to_string();
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO collection_runs (id, source, status, window_start, window_end)
                 VALUES (?1, ?2, 'pending', ?3, ?4)",
                params![
                    run_identifier.clone(),
                    source.as_str(),
                    codec::encode_date(window.start),
                    codec::encode_date(window.end)
                ],
            )
            .await?;

        Ok(run_identifier)
    }

    /// Transición pending → running; estampa started_at.
    #[instrument(skip(self))]
    pub async fn transition_running(&self, run_identifier: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let transitioned = connection
            .execute(
                "UPDATE collection_runs SET status = 'running', started_at = ?2
                 WHERE id = ?1 AND status = 'pending'",
                params![run_identifier, codec::encode_instant(Utc::now())],
            )
            .await?;

        if transitioned == 0 {
            return Err(DbError::RunNotFound);
        }
        Ok(())
    }

    /**
     * Sellado terminal de la corrida: estado final, contadores y
     * finished_at, estampado exactamente una vez.
     *
     * # Errors:
     * - `DbError::RunAlreadySealed`: la corrida ya tenía finished_at.
     */
    #[instrument(skip(self, stats))]
    pub async fn seal(
        &self,
        run_identifier: &str,
        final_status: RunStatus,
        fetched_count: u64,
        stats: UpsertStats,
        error_kind: Option<RunErrorKind>,
        error_detail: Option<String>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let sealed = connection
            .execute(
                "UPDATE collection_runs SET
                    status = ?2,
                    finished_at = ?3,
                    fetched_count = ?4,
                    inserted_count = ?5,
                    updated_count = ?6,
                    error_kind = ?7,
                    error_detail = ?8
                 WHERE id = ?1 AND finished_at IS NULL",
                params![
                    run_identifier,
                    final_status.as_str(),
                    codec::encode_instant(Utc::now()),
                    fetched_count as i64,
                    stats.inserted as i64,
                    stats.updated as i64,
                    error_kind.map(|kind| kind.as_str().to_string()),
                    error_detail
                ],
            )
            .await?;

        if sealed == 0 {
            return Err(DbError::RunAlreadySealed);
        }

        info!(
            "🏁 [RUN_LEDGER]: Run [{}] sealed as [{}].",
            run_identifier,
            final_status.as_str()
        );
        Ok(())
    }

    /// Recupera una corrida puntual.
    pub async fn get(&self, run_identifier: &str) -> Result<CollectionRun, DbError> {
        let connection = self.database_client.get_connection()?;
        let statement = format!("{SELECT_RUN_COLUMNS} WHERE id = ?1");

        let mut query_rows = connection.query(&statement, params![run_identifier]).await?;
        match query_rows.next().await? {
            Some(data_row) => map_row_to_run(&data_row),
            None => Err(DbError::RunNotFound),
        }
    }

    /// Última corrida registrada para una fuente (por orden de creación).
    pub async fn last_for_source(
        &self,
        source: FeedSource,
    ) -> Result<Option<CollectionRun>, DbError> {
        let connection = self.database_client.get_connection()?;
        let statement = format!(
            "{SELECT_RUN_COLUMNS} WHERE source = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"
        );

        let mut query_rows = connection
            .query(&statement, params![source.as_str()])
            .await?;
        match query_rows.next().await? {
            Some(data_row) => Ok(Some(map_row_to_run(&data_row)?)),
            None => Ok(None),
        }
    }

    /// Corridas recientes para el plano de control.
    pub async fn recent(&self, limit: u32) -> Result<Vec<CollectionRun>, DbError> {
        let connection = self.database_client.get_connection()?;
        let statement = format!(
            "{SELECT_RUN_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1"
        );

        let mut query_rows = connection.query(&statement, params![limit as i64]).await?;
        let mut recent_runs = Vec::new();
        while let Some(data_row) = query_rows.next().await? {
            recent_runs.push(map_row_to_run(&data_row)?);
        }
        Ok(recent_runs)
    }
}

fn map_row_to_run(data_row: &Row) -> Result<CollectionRun, DbError> {
    let source_label: String = data_row.get(1)?;
    let status_label: String = data_row.get(2)?;

    Ok(CollectionRun {
        id: data_row.get(0)?,
        source: FeedSource::parse(&source_label)
            .ok_or_else(|| DbError::MappingError(format!("SOURCE_UNKNOWN [{}]", source_label)))?,
        status: RunStatus::parse(&status_label)
            .ok_or_else(|| DbError::MappingError(format!("STATUS_UNKNOWN [{}]", status_label)))?,
        started_at: data_row
            .get::<Option<String>>(3)?
            .map(|raw| codec::decode_instant(&raw))
            .transpose()?,
        finished_at: data_row
            .get::<Option<String>>(4)?
            .map(|raw| codec::decode_instant(&raw))
            .transpose()?,
        fetched_count: data_row.get::<i64>(5)? as u64,
        inserted_count: data_row.get::<i64>(6)? as u64,
        updated_count: data_row.get::<i64>(7)? as u64,
        error_kind: data_row
            .get::<Option<String>>(8)?
            .and_then(|raw| RunErrorKind::parse(&raw)),
        error_detail: data_row.get::<Option<String>>(9)?,
    })
}
