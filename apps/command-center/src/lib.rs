// [apps/command-center/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COMMAND CENTER LIBRARY ROOT (V7.0 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * # Mathematical Proof (Modular Encapsulation):
 * Al declarar 'pub mod' aquí, Rust genera un grafo de visibilidad
 * donde estado, rutas y servicios son hermanos bajo el mismo tronco
 * 'crate', habilitando la inyección de dependencias en compilación.
 * =================================================================
 */

// --- ESTRATO DE INFRAESTRUCTURA Y ARRANQUE ---
/// Captura tipada del entorno con códigos de salida del contrato.
pub mod config;
/// Núcleo de mando y control para la ignición de servicios.
pub mod kernel;

// --- ESTRATO DE DATOS Y ESTADO (L1-APP) ---
/// Gestor del sistema nervioso central del Centro de Mando.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Adaptadores de entrada para ráfagas HTTP.
pub mod handlers;
/// El túnel de mando: definición de rutas y topología de red.
pub mod routes;
/// Forma de fallo visible al consumidor y adaptador dual JSON/form.
pub mod fault;
pub mod extract;

// --- ESTRATO DE SEGURIDAD Y SOPORTE ---
/// Guardianes perimetrales de autenticación del plano de control.
pub mod middleware;
/// Daemons de fondo: Chronos, conducto de ingesta y Reaper.
pub mod services;

/**
 * PRELUDIO DEL CENTRO DE MANDO
 *
 * Re-exportación estratégica de los componentes necesarios para la
 * ignición mínima del sistema desde 'main.rs'.
 */
pub mod prelude {
    pub use crate::config::SystemConfig;
    pub use crate::kernel::{CommandCenterKernel, IgnitionFault};
    pub use crate::state::AppState;
}
