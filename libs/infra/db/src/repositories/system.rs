// [libs/infra/db/src/repositories/system.rs]
/*!
 * =================================================================
 * APARATO: SYSTEM METADATA REPOSITORY (V12.1 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA ACÍDICA DEL ESTADO GLOBAL
 *
 * # Mathematical Proof:
 * 'active_set_version' es un contador monótono sellado dentro de la
 * misma transacción que muta el conjunto activo; su lectura aquí es
 * por tanto una cota inferior consistente para la coherencia de caché.
 * =================================================================
 */

use crate::errors::DbError;
use crate::LedgerClient;
use blacklist_domain_models::source::FeedSource;
use libsql::params;
use tracing::instrument;

/// Repositorio especializado en metadatos críticos de infraestructura.
pub struct SystemMetadataRepository {
    database_client: LedgerClient,
}

impl SystemMetadataRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /// Versión vigente del conjunto activo (0 si jamás se ha sellado).
    #[instrument(skip(self))]
    pub async fn active_set_version(&self) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut query_rows = connection
            .query(
                "SELECT value_int FROM system_metadata WHERE key = 'active_set_version' LIMIT 1",
                (),
            )
            .await?;

        Ok(query_rows
            .next()
            .await?
            .and_then(|row| row.get::<i64>(0).ok())
            .unwrap_or(0) as u64)
    }

    /// Bandera de agenda periódica por fuente. None si jamás fue configurada.
    pub async fn schedule_flag(&self, source: FeedSource) -> Result<Option<bool>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut query_rows = connection
            .query(
                "SELECT value_int FROM system_metadata WHERE key = ?1 LIMIT 1",
                params![schedule_key(source)],
            )
            .await?;

        Ok(query_rows
            .next()
            .await?
            .and_then(|row| row.get::<i64>(0).ok())
            .map(|flag| flag != 0))
    }

    /// Sella la bandera de agenda de la fuente (upsert atómico).
    #[instrument(skip(self))]
    pub async fn seal_schedule_flag(
        &self,
        source: FeedSource,
        enabled: bool,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO system_metadata (key, value_int, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                    value_int = excluded.value_int,
                    updated_at = CURRENT_TIMESTAMP",
                params![schedule_key(source), if enabled { 1i64 } else { 0i64 }],
            )
            .await?;
        Ok(())
    }

    /// Sella el contador de versión de llave de la Bóveda para diagnóstico.
    pub async fn seal_vault_key_version(&self, key_version: u32) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO system_metadata (key, value_int, updated_at)
                 VALUES ('vault_key_version', ?1, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                    value_int = excluded.value_int,
                    updated_at = CURRENT_TIMESTAMP",
                params![key_version as i64],
            )
            .await?;
        Ok(())
    }
}

fn schedule_key(source: FeedSource) -> String {
    format!("schedule_enabled:{}", source.as_str())
}
