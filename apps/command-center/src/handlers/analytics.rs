// [apps/command-center/src/handlers/analytics.rs]
/*!
 * =================================================================
 * APARATO: ANALYTICS SERVING HANDLER (V7.2 - WINDOWED SUMMARY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RESUMEN POR VENTANA Y ESTATUS POR FUENTE
 * =================================================================
 */

use crate::fault::ApiFault;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use blacklist_domain_models::analytics::{AnalyticsWindow, SourceRunSummary, SummaryReport};
use blacklist_domain_models::clock;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

/// TTL de caché del resumen analítico.
const SUMMARY_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct SummaryQueryParams {
    pub window: Option<String>,
}

/// GET /api/v2/analytics/summary?window=<7d|30d|90d>
#[instrument(skip(application_state))]
pub async fn handle_summary(
    State(application_state): State<AppState>,
    Query(query_params): Query<SummaryQueryParams>,
) -> Result<Response, ApiFault> {
    let window_label = query_params.window.unwrap_or_else(|| "7d".to_string());
    let analytics_window = AnalyticsWindow::parse(&window_label).ok_or_else(|| {
        ApiFault::validation(
            format!("'{}' is not an admitted window (7d|30d|90d)", window_label),
            Some("window"),
        )
    })?;

    let cache_params = format!("window={}", analytics_window.as_str());
    if let Some(cached_body) = application_state
        .cache_stratum
        .fetch("summary", &cache_params)
        .await
    {
        return Ok(json_body_response(cached_body));
    }

    let aggregated = application_state
        .ip_record_repository
        .stats(analytics_window.days(), application_state.config.zone_offset)
        .await?;

    let report = SummaryReport {
        window: analytics_window.as_str().to_string(),
        generated_at: clock::render_in(Utc::now(), application_state.config.zone_offset),
        total_active: aggregated.total_active,
        by_source: aggregated.by_source,
        by_threat_level: aggregated.by_threat_level,
        daily_detections: aggregated.daily_detections,
    };

    let rendered_body =
        serde_json::to_string(&report).map_err(|_| ApiFault::store_unavailable())?;

    application_state
        .cache_stratum
        .store("summary", &cache_params, rendered_body.clone(), SUMMARY_CACHE_TTL_SECONDS)
        .await;

    Ok(json_body_response(rendered_body))
}

/// GET /api/v2/sources/status: resumen de última corrida por fuente.
#[instrument(skip(application_state))]
pub async fn handle_sources_status(
    State(application_state): State<AppState>,
) -> Result<Response, ApiFault> {
    let schedule_snapshot = application_state.chronos.status_snapshot();
    let mut per_source_summaries = Vec::with_capacity(schedule_snapshot.len());

    for schedule_view in schedule_snapshot {
        let last_run = application_state
            .run_ledger
            .last_for_source(schedule_view.source)
            .await?;

        per_source_summaries.push(SourceRunSummary {
            source: schedule_view.source,
            enabled: schedule_view.enabled,
            last_run,
            consecutive_failures: schedule_view.consecutive_failures,
            next_run_at: schedule_view.next_run_at,
        });
    }

    Ok(Json(per_source_summaries).into_response())
}

fn json_body_response(body: String) -> Response {
    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
