// [apps/command-center/src/services/mod.rs]
/**
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V7.0 - PIPELINE ENABLED)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. MODULARIDAD: Cada servicio opera como una unidad atómica aislada.
 * 2. CHRONOS: El scheduler es la única autoridad de despacho de
 *    corridas; el plano de control jamás toca el pipeline directo.
 * =================================================================
 */

pub mod chronos;
pub mod conduit;
pub mod reaper;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use chronos::{ChronosScheduler, SchedulerFault, SourceScheduleView};
pub use conduit::IngestionConduit;
pub use reaper::spawn_reaper;
