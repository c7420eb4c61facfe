// [libs/infra/db/src/repositories/auth_attempts.rs]
/*!
 * =================================================================
 * APARATO: AUTH AUDIT REPOSITORY (V12.1 - FIVE STRIKES)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: AUDITORÍA DE AUTENTICACIÓN Y SONDA DE CANDADO
 *
 * El candado se computa sobre la racha de fallos consecutivos más
 * reciente: un éxito intermedio la corta. La duración del bloqueo la
 * decide el Chronos con la configuración del entorno.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::codec;
use crate::LedgerClient;
use blacklist_domain_models::credential::AuthAttempt;
use blacklist_domain_models::source::FeedSource;
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::instrument;

/// Lectura del estado de racha para la decisión de candado.
#[derive(Debug, Clone, Default)]
pub struct LockoutProbe {
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl LockoutProbe {
    /// Veredicto de candado frente a la política configurada.
    pub fn is_locked(
        &self,
        max_attempts: u32,
        block_duration: chrono::Duration,
        observation_instant: DateTime<Utc>,
    ) -> bool {
        if self.consecutive_failures < max_attempts {
            return false;
        }
        match self.last_failure_at {
            Some(last_failure) => observation_instant < last_failure + block_duration,
            None => false,
        }
    }
}

/// Repositorio de la bitácora de intentos de autenticación.
pub struct AuthAttemptRepository {
    database_client: LedgerClient,
}

impl AuthAttemptRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /// Registra un intento (éxito o fallo) en la bitácora.
    #[instrument(skip(self, attempt), fields(source = %attempt.source, success = attempt.success))]
    pub async fn record(&self, attempt: &AuthAttempt) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO auth_attempts
                    (source, username, attempted_at, success, failure_reason, remote_ip)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    attempt.source.as_str(),
                    attempt.username.clone(),
                    codec::encode_instant(attempt.when),
                    if attempt.success { 1i64 } else { 0i64 },
                    attempt.failure_reason.clone(),
                    attempt.remote_ip.clone()
                ],
            )
            .await?;
        Ok(())
    }

    /**
     * Sonda de racha: cuenta los fallos consecutivos más recientes de la
     * fuente (la racha se corta en el primer éxito).
     */
    #[instrument(skip(self))]
    pub async fn probe_lockout(&self, source: FeedSource) -> Result<LockoutProbe, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut recent_rows = connection
            .query(
                "SELECT success, attempted_at FROM auth_attempts
                 WHERE source = ?1 ORDER BY attempted_at DESC, id DESC LIMIT 32",
                params![source.as_str()],
            )
            .await?;

        let mut probe = LockoutProbe::default();

        while let Some(data_row) = recent_rows.next().await? {
            let was_success: i64 = data_row.get(0)?;
            if was_success != 0 {
                break; // La racha termina en el primer éxito.
            }

            probe.consecutive_failures += 1;
            if probe.last_failure_at.is_none() {
                probe.last_failure_at = Some(codec::decode_instant(&data_row.get::<String>(1)?)?);
            }
        }

        Ok(probe)
    }
}
