// [libs/infra/db/src/repositories/credentials.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL REGISTRY REPOSITORY (V12.0 - SECRET FREE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ESPEJO NO-SECRETO DE LA BÓVEDA EN EL LEDGER
 *
 * El material secreto jamás toca este repositorio: vive cifrado en la
 * Bóveda (blacklist-core-vault). Aquí se publica únicamente el
 * metadato operativo y el veredicto de la última sonda.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::codec;
use crate::LedgerClient;
use blacklist_domain_models::credential::CredentialMetadata;
use blacklist_domain_models::source::FeedSource;
use chrono::Utc;
use libsql::{params, Row};
use tracing::instrument;

/// Repositorio del espejo publicable de credenciales.
pub struct CredentialRegistryRepository {
    database_client: LedgerClient,
}

impl CredentialRegistryRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /// Reemplaza (o alta) el metadato de la fuente tras un put en la Bóveda.
    #[instrument(skip(self))]
    pub async fn upsert(&self, source: FeedSource, username: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO credentials (source, username, rotated_at, valid, updated_at)
                 VALUES (?1, ?2, ?3, 1, CURRENT_TIMESTAMP)
                 ON CONFLICT(source) DO UPDATE SET
                    username = excluded.username,
                    rotated_at = excluded.rotated_at,
                    valid = 1,
                    updated_at = CURRENT_TIMESTAMP",
                params![source.as_str(), username, codec::encode_instant(Utc::now())],
            )
            .await?;
        Ok(())
    }

    /// Sonda del adaptador: sella el veredicto de la última autenticación.
    #[instrument(skip(self))]
    pub async fn probe(&self, source: FeedSource, authentication_succeeded: bool) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "UPDATE credentials SET valid = ?2, updated_at = CURRENT_TIMESTAMP
                 WHERE source = ?1",
                params![source.as_str(), if authentication_succeeded { 1i64 } else { 0i64 }],
            )
            .await?;
        Ok(())
    }

    /// Metadato puntual de una fuente.
    pub async fn get(&self, source: FeedSource) -> Result<Option<CredentialMetadata>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut query_rows = connection
            .query(
                "SELECT source, username, rotated_at, valid FROM credentials WHERE source = ?1",
                params![source.as_str()],
            )
            .await?;

        match query_rows.next().await? {
            Some(data_row) => Ok(Some(map_row_to_metadata(&data_row)?)),
            None => Ok(None),
        }
    }

    /// Inventario completo para el plano de control.
    pub async fn list(&self) -> Result<Vec<CredentialMetadata>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut query_rows = connection
            .query(
                "SELECT source, username, rotated_at, valid FROM credentials ORDER BY source",
                (),
            )
            .await?;

        let mut registry = Vec::new();
        while let Some(data_row) = query_rows.next().await? {
            registry.push(map_row_to_metadata(&data_row)?);
        }
        Ok(registry)
    }
}

fn map_row_to_metadata(data_row: &Row) -> Result<CredentialMetadata, DbError> {
    let source_label: String = data_row.get(0)?;

    Ok(CredentialMetadata {
        source: FeedSource::parse(&source_label)
            .ok_or_else(|| DbError::MappingError(format!("SOURCE_UNKNOWN [{}]", source_label)))?,
        username: data_row.get(1)?,
        rotated_at: data_row
            .get::<Option<String>>(2)?
            .map(|raw| codec::decode_instant(&raw))
            .transpose()?,
        valid: data_row.get::<i64>(3)? != 0,
    })
}
