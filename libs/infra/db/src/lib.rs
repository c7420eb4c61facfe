// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LEDGER LIBRARY ROOT (V12.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL SUSTRATO DE PERSISTENCIA
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::LedgerClient;
pub use errors::DbError;
