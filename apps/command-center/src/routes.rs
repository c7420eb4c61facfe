// [apps/command-center/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V7.3 - DUAL PLANE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA DE RED DE LECTURA Y MANDO
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología separa dos planos con escudos independientes:
 * 1. PLANO DE LECTURA: Formatos del conjunto activo y analítica;
 *    abierto por defecto, API key opcional por configuración.
 * 2. PLANO DE CONTROL: Gobernanza del Chronos, credenciales y
 *    curaduría; siempre tras el guardia de autenticación dual.
 * =================================================================
 */

use crate::handlers::{analytics, blacklist, collection, health};
use crate::middleware::{control_guard, read_guard};
use crate::state::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_command_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para el dashboard analítico y herramientas de Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, "x-api-key".parse().unwrap()])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE LECTURA: Consumidores del conjunto activo.
    let serving_stratum = Router::new()
        .route("/api/blacklist/active", get(blacklist::handle_active_list))
        .route("/api/fortigate", get(blacklist::handle_fortigate))
        .route("/api/v2/blacklist/enhanced", get(blacklist::handle_enhanced))
        .route("/api/v2/analytics/summary", get(analytics::handle_summary))
        .route("/api/v2/sources/status", get(analytics::handle_sources_status))
        .layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            read_guard,
        ));

    // ESTRATO DE MANDO: Gobernanza del Chronos y curaduría del operador.
    let control_stratum = Router::new()
        .route("/api/collection/status", get(collection::handle_status))
        .route("/api/collection/enable", post(collection::handle_enable))
        .route("/api/collection/disable", post(collection::handle_disable))
        .route("/api/collection/:source/trigger", post(collection::handle_trigger))
        .route("/api/collection/:source/cancel", post(collection::handle_cancel))
        .route("/api/collection/credentials", post(collection::handle_credentials))
        .route("/api/v2/blacklist/manual", post(blacklist::handle_manual_submission))
        .route("/api/v2/blacklist/purge", post(blacklist::handle_purge))
        .layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            control_guard,
        ));

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/health", get(health::handle_health))
        .merge(serving_stratum)
        .merge(control_stratum)
        .layer(TraceLayer::new_for_http())
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
