// [libs/domain/ingest/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INGEST LIBRARY ROOT (V5.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LA REFINERÍA DE LOTES
 * =================================================================
 */

pub mod refinery;

pub use refinery::{canonicalize_ip, BatchRefinery, RefinedBatch, RefinedRecord};
