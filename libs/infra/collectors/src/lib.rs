// [libs/infra/collectors/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COLLECTORS LIBRARY ROOT (V8.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LOS ADAPTADORES UPSTREAM
 *
 * # Topología de Módulos:
 * - contract: Trait uniforme, taxonomía de fallos y cosecha.
 * - retry:    Motor de reintentos con backoff exponencial.
 * - parse:    Parseo de payloads HTML-table y hoja de cálculo.
 * - regtech:  Adaptador del portal administrativo regulatorio.
 * - secudium: Adaptador del boletín SECUDIUM (disable-capable).
 * - stub:     Adaptador determinista para el Proving Grounds.
 * =================================================================
 */

pub mod contract;
pub mod parse;
pub mod regtech;
pub mod retry;
pub mod secudium;
pub mod stub;

pub use contract::{
    CancellationFlag, CollectorError, CollectorHarvest, FeedCollector, UpstreamCredentials,
};
pub use regtech::RegtechCollector;
pub use secudium::SecudiumCollector;
pub use stub::StubCollector;
