// [apps/command-center/src/handlers/collection.rs]
/*!
 * =================================================================
 * APARATO: COLLECTION CONTROL PLANE HANDLER (V7.5 - CHRONOS GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MANDO DEL SCHEDULER Y GESTIÓN DE CREDENCIALES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NEVER BYPASS: El plano de control habla exclusivamente con el
 *    Chronos; jamás toca el pipeline de ingesta directo.
 * 2. NON BLOCKING STATUS: El estatus se proyecta desde snapshots; una
 *    corrida en vuelo jamás bloquea la respuesta.
 * 3. IDEMPOTENT TRIGGER: El segundo trigger concurrente colisiona con
 *    409 'already_running' según la regla de vuelo único.
 * =================================================================
 */

use crate::extract::parse_dual_payload;
use crate::fault::ApiFault;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::source::FeedSource;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::services::chronos::SchedulerFault;

/// GET /api/collection/status: gobernanza y corridas recientes.
#[instrument(skip(application_state))]
pub async fn handle_status(
    State(application_state): State<AppState>,
) -> Result<Response, ApiFault> {
    let schedule_snapshot = application_state.chronos.status_snapshot();

    let enabled_sources: Vec<&str> = schedule_snapshot
        .iter()
        .filter(|view| view.enabled)
        .map(|view| view.source.as_str())
        .collect();

    let in_flight: Vec<&str> = schedule_snapshot
        .iter()
        .filter(|view| view.in_flight)
        .map(|view| view.source.as_str())
        .collect();

    let last_runs = application_state.run_ledger.recent(10).await?;
    let credential_mirror = application_state.credential_registry.list().await?;

    Ok(Json(json!({
        "collection_enabled": application_state.config.collection_enabled
            && !application_state.config.force_disable_collection,
        "enabled_sources": enabled_sources,
        "in_flight": in_flight,
        "last_runs": last_runs,
        "schedules": schedule_snapshot,
        "credentials": credential_mirror,
        "vault_sources": application_state.credential_vault.guarded_sources(),
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceTogglePayload {
    pub source: String,
}

/// POST /api/collection/enable: enciende la agenda periódica de una fuente.
#[instrument(skip(application_state, headers, body))]
pub async fn handle_enable(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    toggle_schedule(application_state, headers, body, true).await
}

/// POST /api/collection/disable: apaga la agenda sin cancelar corridas en vuelo.
#[instrument(skip(application_state, headers, body))]
pub async fn handle_disable(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    toggle_schedule(application_state, headers, body, false).await
}

async fn toggle_schedule(
    application_state: AppState,
    headers: HeaderMap,
    body: Bytes,
    enabled: bool,
) -> Result<Response, ApiFault> {
    let payload: SourceTogglePayload = parse_dual_payload(&headers, &body)?;
    let source = parse_source(&payload.source)?;

    application_state
        .chronos
        .set_enabled(source, enabled)
        .await
        .map_err(map_scheduler_fault)?;

    Ok(Json(json!({ "source": source.as_str(), "enabled": enabled })).into_response())
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TriggerWindowPayload {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// POST /api/collection/:source/trigger: corrida bajo demanda (202 o 409).
#[instrument(skip(application_state, headers, body))]
pub async fn handle_trigger(
    State(application_state): State<AppState>,
    Path(source_label): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    let source = parse_source(&source_label)?;

    let window_payload: TriggerWindowPayload = if body.is_empty() {
        TriggerWindowPayload::default()
    } else {
        parse_dual_payload(&headers, &body)?
    };

    let requested_window = match (window_payload.start_date, window_payload.end_date) {
        (Some(start), Some(end)) if start <= end => Some(DateRange::new(start, end)),
        (Some(_), Some(_)) => {
            return Err(ApiFault::validation(
                "start_date must not exceed end_date",
                Some("start_date"),
            ));
        }
        (None, None) => None,
        _ => {
            return Err(ApiFault::validation(
                "start_date and end_date travel together",
                Some("end_date"),
            ));
        }
    };

    let run_identifier = application_state
        .chronos
        .trigger(source, requested_window)
        .await
        .map_err(map_scheduler_fault)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "run_id": run_identifier, "source": source.as_str() })),
    )
        .into_response())
}

/// POST /api/collection/:source/cancel: cancelación cooperativa.
#[instrument(skip(application_state))]
pub async fn handle_cancel(
    State(application_state): State<AppState>,
    Path(source_label): Path<String>,
) -> Result<Response, ApiFault> {
    let source = parse_source(&source_label)?;
    let cancellation_raised = application_state.chronos.cancel(source);

    if cancellation_raised {
        Ok(Json(json!({ "source": source.as_str(), "cancelling": true })).into_response())
    } else {
        Err(ApiFault::not_found(format!(
            "no run in flight for '{}'",
            source.as_str()
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialSubmissionPayload {
    pub source: String,
    pub username: String,
    pub password: String,
    pub bearer_token: Option<String>,
}

/// POST /api/collection/credentials: alta o reemplazo en la Bóveda.
#[instrument(skip(application_state, headers, body))]
pub async fn handle_credentials(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    let payload: CredentialSubmissionPayload = parse_dual_payload(&headers, &body)?;
    let source = parse_source(&payload.source)?;

    application_state
        .credential_vault
        .put(
            source,
            payload.username.clone(),
            payload.password,
            payload.bearer_token,
        )
        .map_err(|vault_fault| {
            tracing::error!("💀 [CONTROL_PLANE]: Vault write rejected: {}", vault_fault);
            ApiFault::store_unavailable()
        })?;

    // Espejo no-secreto en el Ledger para el plano de control.
    application_state
        .credential_registry
        .upsert(source, &payload.username)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "source": source.as_str(), "username": payload.username })),
    )
        .into_response())
}

// --- ESTRATO PRIVADO: MAPEOS ---

fn parse_source(source_label: &str) -> Result<FeedSource, ApiFault> {
    FeedSource::parse(source_label).ok_or_else(|| {
        ApiFault::validation(
            format!("'{}' is not a recognized source", source_label),
            Some("source"),
        )
    })
}

fn map_scheduler_fault(scheduler_fault: SchedulerFault) -> ApiFault {
    match scheduler_fault {
        SchedulerFault::AlreadyRunning => ApiFault::already_running("collection"),
        SchedulerFault::RateLimited(detail) => ApiFault::rate_limited(detail),
        SchedulerFault::CollectionDisabled => ApiFault {
            status: StatusCode::FORBIDDEN,
            kind: "validation_error",
            message: "collection is globally disabled".into(),
            field: None,
        },
        SchedulerFault::UnknownSource(label) => {
            ApiFault::validation(format!("'{}' has no collector adapter", label), Some("source"))
        }
        SchedulerFault::Ledger(database_fault) => database_fault.into(),
    }
}
