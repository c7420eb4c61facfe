// [apps/command-center/src/handlers/health.rs]
/*!
 * =================================================================
 * APARATO: LIVENESS HANDLER (V7.1 - UPSTREAM FREE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: VEREDICTO DE SALUD POR COMPONENTE
 *
 * El veredicto jamás depende de los upstreams de recolección: solo
 * del Ledger local, del estrato de caché y de la gobernanza de
 * recolección. Un primario de caché caído reporta 'degraded', no
 * 'unhealthy': el respaldo en proceso sigue sirviendo.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn handle_health(State(application_state): State<AppState>) -> impl IntoResponse {
    // Componente DB: la sonda de vitalidad del cliente emite el veredicto.
    let database_component = if application_state.database_client.probe_link().await {
        "healthy"
    } else {
        "unhealthy"
    };

    let cache_component = application_state.cache_stratum.tier_state().as_str();

    let collector_component = if application_state.config.force_disable_collection
        || !application_state.config.collection_enabled
    {
        "disabled"
    } else {
        "enabled"
    };

    let overall_status = if database_component == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": overall_status,
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "db": database_component,
            "cache": cache_component,
            "collector": collector_component,
        }
    }))
}
