// [apps/command-center/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HANDLER ORCHESTRATION HUB (V7.0 - COMPLETE MATRIX)
 * CLASIFICACIÓN: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE PUNTOS DE ENTRADA
 *
 * # Topología de Módulos:
 * - health:     Liveness sin dependencia de upstreams.
 * - blacklist:  Listado plano, FortiGate, registros enriquecidos,
 *               altas manuales y purga de operador.
 * - analytics:  Resumen por ventana y estatus por fuente.
 * - collection: Plano de control del Chronos y credenciales.
 * =================================================================
 */

pub mod analytics;
pub mod blacklist;
pub mod collection;
pub mod health;
