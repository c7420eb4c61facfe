// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V12.1 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONFIGURATION AWARENESS: 'ConfigurationError' distingue entre
 *    fallos de red y variables de entorno vacías en el arranque.
 * 2. LEDGER SEMANTICS: Variantes dedicadas para el sellado único de
 *    corridas y los colapsos transaccionales del conjunto activo.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el cluster libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Error al comprometer una secuencia multi-tabla. El lote se revierte.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,

    // --- ESTRATO DEL CONJUNTO ACTIVO ---

    /// La dirección solicitada no existe en el Ledger.
    #[error("[L3_LEDGER_FAULT]: ADDRESS_NOT_FOUND")]
    RecordNotFound,

    // --- ESTRATO DEL LEDGER DE CORRIDAS ---

    /// La corrida solicitada no existe.
    #[error("[L3_RUN_FAULT]: RUN_NOT_FOUND")]
    RunNotFound,

    /// Intento de mutar una corrida ya sellada (finished_at estampado).
    #[error("[L3_RUN_FAULT]: RUN_ALREADY_SEALED")]
    RunAlreadySealed,
}
