// [libs/infra/cache/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TIERED CACHE LIBRARY ROOT (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL ESTRATO DE LECTURA
 * =================================================================
 */

pub mod tiered;

pub use tiered::{CacheTierState, TieredCache};
