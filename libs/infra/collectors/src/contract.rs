// [libs/infra/collectors/src/contract.rs]
/*!
 * =================================================================
 * APARATO: COLLECTOR CONTRACT (V8.2 - UNIFORM CAPABILITY SET)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: CONTRATO {authenticate, fetch, parse} UNIFORME
 *
 * Todo adaptador expone la misma superficie: una corrida sobre una
 * ventana de fechas que cristaliza filas crudas + contabilidad de
 * páginas. El Chronos traduce la taxonomía de fallos al Ledger de
 * corridas sin conocer el protocolo de cada upstream.
 * =================================================================
 */

use async_trait::async_trait;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::run::RunErrorKind;
use blacklist_domain_models::source::FeedSource;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;

/// Bandera cooperativa de cancelación, consultada entre descargas.
pub type CancellationFlag = Arc<AtomicBool>;

/// Material en claro entregado por la Bóveda para una corrida puntual.
#[derive(Debug, Clone)]
pub struct UpstreamCredentials {
    pub username: String,
    pub secret: String,
    /// Token de larga vida inyectado fuera de banda; se prefiere sobre
    /// el login de formulario y cae a credenciales al expirar.
    pub bearer_token: Option<String>,
}

/// Taxonomía uniforme de fallos de un adaptador.
#[derive(Error, Debug, Clone)]
pub enum CollectorError {
    /// El upstream rechazó la autenticación (credenciales o token).
    #[error("[L3_COLLECTOR_FAULT]: AUTH_REJECTED -> {0}")]
    AuthFailed(String),

    /// Red caída, timeout o 5xx persistente tras agotar reintentos.
    #[error("[L3_COLLECTOR_FAULT]: SOURCE_UNREACHABLE -> {0}")]
    SourceUnavailable(String),

    /// Payload malformado sin ninguna fila recuperable.
    #[error("[L3_COLLECTOR_FAULT]: PAYLOAD_MALFORMED -> {0}")]
    ParseError(String),

    /// El upstream aplicó throttling explícito (HTTP 429).
    #[error("[L3_COLLECTOR_FAULT]: UPSTREAM_THROTTLED -> {0}")]
    RateLimited(String),

    /// Fuente deshabilitada por configuración; corrida no-op, no fallo.
    #[error("[L3_COLLECTOR_FAULT]: SOURCE_DISABLED_BY_CONFIGURATION")]
    Disabled,

    /// Cancelación cooperativa observada entre descargas.
    #[error("[L3_COLLECTOR_FAULT]: RUN_CANCELLED_BY_OPERATOR")]
    Cancelled,
}

impl CollectorError {
    /// Traducción al kind persistido en el Ledger de corridas.
    /// Cancelled no porta kind: su estado terminal es 'cancelled'.
    pub fn run_error_kind(&self) -> Option<RunErrorKind> {
        match self {
            CollectorError::AuthFailed(_) => Some(RunErrorKind::AuthFailed),
            CollectorError::SourceUnavailable(_) => Some(RunErrorKind::SourceUnavailable),
            CollectorError::ParseError(_) => Some(RunErrorKind::ParseError),
            CollectorError::RateLimited(_) => Some(RunErrorKind::RateLimited),
            CollectorError::Disabled => Some(RunErrorKind::Disabled),
            CollectorError::Cancelled => None,
        }
    }
}

/// Cosecha de una corrida: filas crudas + contabilidad de páginas.
#[derive(Debug, Clone, Default)]
pub struct CollectorHarvest {
    pub records: Vec<RawFeedRecord>,
    pub pages_fetched: u32,
    /// Páginas que agotaron sus reintentos; >0 degrada la corrida a 'partial'.
    pub pages_failed: u32,
    /// Filas descartadas en parseo (fecha no coercionable, celdas rotas).
    pub rows_discarded: u64,
}

/// Contrato uniforme de los adaptadores de recolección.
#[async_trait]
pub trait FeedCollector: Send + Sync {
    /// Fuente que este adaptador representa.
    fn source(&self) -> FeedSource;

    /**
     * Ejecuta la corrida completa: authenticate + fetch + parse.
     *
     * La bandera de cancelación se consulta entre descargas; un
     * adaptador cancelado retorna `CollectorError::Cancelled` sin
     * emitir cosecha (la corrida no compromete nada).
     */
    async fn collect(
        &self,
        window: DateRange,
        credentials: &UpstreamCredentials,
        cancellation_flag: &CancellationFlag,
    ) -> Result<CollectorHarvest, CollectorError>;
}
