// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: LEDGER ACCESS CLIENT (V13.0 - TYPED LOCATION)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CLASIFICACIÓN DEL DESTINO, BOOTSTRAP Y ENLACES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TYPED LOCATION: El DATABASE_URL se clasifica en un enum tipado
 *    (remoto / archivo / efímero) antes de tocar el driver; la falta
 *    de token para un cluster remoto colapsa en la clasificación.
 * 2. SINGLE BOOTSTRAP PATH: Una única sesión ejecuta el esquema sin
 *    ramas por modo; en destinos efímeros esa misma sesión queda
 *    retenida, porque SQLite descarta una base compartida en RAM al
 *    cerrarse su última conexión.
 * 3. HEALTH PROBE: El cliente expone la sonda de vitalidad que el
 *    endpoint de salud consulta, sin SQL suelto en los handlers.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_ledger_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Destino clasificado del Ledger según el DATABASE_URL del entorno.
enum LedgerLocation {
    /// Cluster libSQL remoto; el token de acceso es obligatorio.
    Remote { url: String, access_token: String },
    /// Archivo SQLite local (despliegue de contenedor único).
    LocalFile(String),
    /// Base en RAM compartida (Proving Grounds y arranques efímeros).
    Ephemeral(String),
}

impl LedgerLocation {
    /**
     * Clasifica la URL cruda. La validación ocurre aquí, antes de
     * instanciar driver alguno.
     *
     * # Errors:
     * - `DbError::ConfigurationError`: URL vacía o cluster remoto sin token.
     */
    fn classify(raw_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        let trimmed_url = raw_url.trim();
        if trimmed_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        let points_to_cluster =
            trimmed_url.starts_with("libsql://") || trimmed_url.starts_with("https://");

        if points_to_cluster {
            let token = access_token.ok_or_else(|| {
                DbError::ConfigurationError("CLUSTER_TOKEN_MISSING".into())
            })?;
            return Ok(LedgerLocation::Remote {
                url: trimmed_url.to_string(),
                access_token: token,
            });
        }

        let lives_in_ram =
            trimmed_url.contains(":memory:") || trimmed_url.contains("mode=memory");

        if lives_in_ram {
            Ok(LedgerLocation::Ephemeral(trimmed_url.to_string()))
        } else {
            Ok(LedgerLocation::LocalFile(trimmed_url.to_string()))
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LedgerLocation::Remote { .. } => "remote_cluster",
            LedgerLocation::LocalFile(_) => "local_file",
            LedgerLocation::Ephemeral(_) => "ephemeral_ram",
        }
    }

    /// Instancia el driver de libSQL para el destino clasificado.
    async fn forge_driver(self) -> Result<Database, DbError> {
        let forged = match self {
            LedgerLocation::Remote { url, access_token } => {
                Builder::new_remote(url, access_token).build().await
            }
            LedgerLocation::LocalFile(path) | LedgerLocation::Ephemeral(path) => {
                Builder::new_local(path).build().await
            }
        };

        forged.map_err(|driver_fault| {
            DbError::ConnectionError(format!("DRIVER_FORGE_REJECTED: {}", driver_fault))
        })
    }
}

/// Cliente de acceso al Ledger con bootstrap de esquema incorporado.
#[derive(Clone)]
pub struct LedgerClient {
    driver: Arc<Database>,
    /// Sesión que ejecutó el bootstrap. Retenida solo para destinos
    /// efímeros: mientras viva, la base en RAM no se descarta.
    _schema_session: Option<Arc<Connection>>,
}

impl LedgerClient {
    /**
     * Clasifica el destino, forja el driver y sincroniza el esquema.
     *
     * El esquema corre siempre sobre una sesión dedicada; para una base
     * en RAM esa sesión se retiene de por vida del cliente, de modo que
     * las tablas recién solidificadas sigan visibles para toda conexión
     * posterior.
     */
    #[instrument(skip(access_token))]
    pub async fn connect(
        database_connection_url: &str,
        access_token: Option<String>,
    ) -> Result<Self, DbError> {
        let location = LedgerLocation::classify(database_connection_url, access_token)?;
        let location_label = location.label();

        info!("🔌 [LEDGER]: Opening {} link to [{}]", location_label, database_connection_url);

        let retain_schema_session = matches!(location, LedgerLocation::Ephemeral(_));
        let driver = Arc::new(location.forge_driver().await?);

        // Bootstrap idempotente sobre una sesión dedicada.
        let schema_session = driver.connect().map_err(|session_fault| {
            DbError::ConnectionError(format!("SCHEMA_SESSION_REJECTED: {}", session_fault))
        })?;

        apply_full_ledger_schema(&schema_session)
            .await
            .map_err(|bootstrap_fault| {
                DbError::ConnectionError(format!("SCHEMA_BOOTSTRAP_REJECTED: {}", bootstrap_fault))
            })?;

        let pinned_session = if retain_schema_session {
            debug!("📌 [LEDGER]: Ephemeral target. Schema session pinned for client lifetime.");
            Some(Arc::new(schema_session))
        } else {
            None
        };

        Ok(Self {
            driver,
            _schema_session: pinned_session,
        })
    }

    /// Abre una conexión fresca para una operación de repositorio.
    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|allocation_fault| {
            warn!("⚠️ [LEDGER]: Connection allocation rejected: {}", allocation_fault);
            DbError::ConnectionError(allocation_fault.to_string())
        })
    }

    /// Sonda de vitalidad para el componente 'db' del health check.
    /// Jamás propaga detalle interno: solo el veredicto.
    pub async fn probe_link(&self) -> bool {
        match self.get_connection() {
            Ok(probe_session) => probe_session.query("SELECT 1", ()).await.is_ok(),
            Err(_) => false,
        }
    }
}
