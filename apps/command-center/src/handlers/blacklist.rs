// [apps/command-center/src/handlers/blacklist.rs]
/*!
 * =================================================================
 * APARATO: BLACKLIST SERVING HANDLER (V7.4 - FORMAT CONTRACTS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FORMATOS DE SALIDA DEL CONJUNTO ACTIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATELESS FORMATTERS: Los formateadores son funciones puras
 *    sobre el snapshot del Ledger; la capa jamás toca upstreams.
 * 2. CACHE KEYED BY VERSION: Toda respuesta viaja bajo la llave
 *    (endpoint, params, versión del conjunto activo).
 * 3. NUMERIC ORDER: El listado plano emite direcciones en orden
 *    numérico ascendente (v4 antes que v6) vía la llave de orden.
 * =================================================================
 */

use crate::extract::parse_dual_payload;
use crate::fault::ApiFault;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use blacklist_domain_models::analytics::{FortigateEntry, FortigateEnvelope};
use blacklist_domain_models::clock;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::record::{IpRecord, IpRecordView};
use blacklist_domain_models::source::FeedSource;
use blacklist_domain_models::threat::ThreatLevel;
use blacklist_domain_models::clock::DateRange;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

/// TTL de caché del listado plano y los registros enriquecidos.
const ACTIVE_SET_CACHE_TTL_SECONDS: u64 = 300;
/// TTL de caché del sobre FortiGate (re-descarga frecuente del firewall).
const FORTIGATE_CACHE_TTL_SECONDS: u64 = 60;

// --- FORMATEADORES PUROS (CONTRATOS DE SALIDA) ---

/**
 * Renderiza el listado plano: una dirección por línea en orden numérico
 * ascendente, con líneas '#' de metadatos del generador.
 */
pub fn render_plain_list(
    active_records: &[IpRecord],
    active_set_version: u64,
    generated_at: DateTime<Utc>,
    zone_offset: FixedOffset,
) -> String {
    let mut rendered = String::with_capacity(64 + active_records.len() * 16);
    rendered.push_str(&format!("# blacklist-command-center v{}\n", env!("CARGO_PKG_VERSION")));
    rendered.push_str(&format!(
        "# generated_at: {}\n",
        clock::render_in(generated_at, zone_offset)
    ));
    rendered.push_str(&format!("# active_set_version: {}\n", active_set_version));
    rendered.push_str(&format!("# count: {}\n", active_records.len()));

    for record in active_records {
        rendered.push_str(&record.ip);
        rendered.push('\n');
    }
    rendered
}

/**
 * Construye el sobre del conector externo FortiGate. 'ttl_seconds' es
 * el mínimo de vida restante sobre las entradas, acotado a cero.
 */
pub fn build_fortigate_envelope(
    active_records: &[IpRecord],
    active_set_version: u64,
    observation_instant: DateTime<Utc>,
    zone_offset: FixedOffset,
) -> FortigateEnvelope {
    let mut minimum_remaining_lifetime: Option<i64> = None;
    let mut entries = Vec::with_capacity(active_records.len());

    for record in active_records {
        // El formateador es puro: re-certifica la vigencia del snapshot.
        if !record.is_live_at(observation_instant) {
            continue;
        }
        let expires_at = match record.expires_at {
            Some(expiry) => expiry,
            None => continue,
        };

        let remaining_lifetime = (expires_at - observation_instant).num_seconds().max(0);
        minimum_remaining_lifetime = Some(match minimum_remaining_lifetime {
            Some(current_minimum) => current_minimum.min(remaining_lifetime),
            None => remaining_lifetime,
        });

        entries.push(FortigateEntry {
            ip: record.ip.clone(),
            expires_at: clock::render_in(expires_at, zone_offset),
        });
    }

    FortigateEnvelope {
        version: active_set_version.to_string(),
        generated_at: clock::render_in(observation_instant, zone_offset),
        ttl_seconds: minimum_remaining_lifetime.unwrap_or(0),
        entries,
    }
}

// --- HANDLERS DE LECTURA ---

/// GET /api/blacklist/active: listado plano text/plain.
#[instrument(skip(application_state))]
pub async fn handle_active_list(
    State(application_state): State<AppState>,
) -> Result<Response, ApiFault> {
    if let Some(cached_body) = application_state.cache_stratum.fetch("active", "plain").await {
        return Ok(plain_text_response(cached_body));
    }

    let active_records = application_state
        .ip_record_repository
        .query_active(Utc::now(), true)
        .await?;

    let rendered_body = render_plain_list(
        &active_records,
        application_state.cache_stratum.current_version(),
        Utc::now(),
        application_state.config.zone_offset,
    );

    application_state
        .cache_stratum
        .store("active", "plain", rendered_body.clone(), ACTIVE_SET_CACHE_TTL_SECONDS)
        .await;

    Ok(plain_text_response(rendered_body))
}

/// GET /api/fortigate: sobre JSON del conector externo.
#[instrument(skip(application_state))]
pub async fn handle_fortigate(
    State(application_state): State<AppState>,
) -> Result<Response, ApiFault> {
    if let Some(cached_body) = application_state.cache_stratum.fetch("fortigate", "json").await {
        return Ok(json_body_response(cached_body));
    }

    let active_records = application_state
        .ip_record_repository
        .query_active(Utc::now(), true)
        .await?;

    let envelope = build_fortigate_envelope(
        &active_records,
        application_state.cache_stratum.current_version(),
        Utc::now(),
        application_state.config.zone_offset,
    );

    let rendered_body = serde_json::to_string(&envelope)
        .map_err(|_| ApiFault::store_unavailable())?;

    application_state
        .cache_stratum
        .store("fortigate", "json", rendered_body.clone(), FORTIGATE_CACHE_TTL_SECONDS)
        .await;

    Ok(json_body_response(rendered_body))
}

/// GET /api/v2/blacklist/enhanced: registros completos en JSON.
#[instrument(skip(application_state))]
pub async fn handle_enhanced(
    State(application_state): State<AppState>,
) -> Result<Response, ApiFault> {
    if let Some(cached_body) = application_state.cache_stratum.fetch("enhanced", "json").await {
        return Ok(json_body_response(cached_body));
    }

    let active_records = application_state
        .ip_record_repository
        .query_active(Utc::now(), true)
        .await?;

    let projected_views: Vec<IpRecordView> = active_records
        .iter()
        .map(|record| IpRecordView::project(record, application_state.config.zone_offset))
        .collect();

    let rendered_body = serde_json::to_string(&projected_views)
        .map_err(|_| ApiFault::store_unavailable())?;

    application_state
        .cache_stratum
        .store("enhanced", "json", rendered_body.clone(), ACTIVE_SET_CACHE_TTL_SECONDS)
        .await;

    Ok(json_body_response(rendered_body))
}

// --- HANDLERS DE CURADURÍA DEL OPERADOR ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualSubmissionPayload {
    pub ip: String,
    pub detection_date: Option<NaiveDate>,
    pub threat_level: Option<ThreatLevel>,
    pub country: Option<String>,
    pub description: Option<String>,
}

/// POST /api/v2/blacklist/manual: alta manual vía el conducto estándar.
#[instrument(skip(application_state, headers, body))]
pub async fn handle_manual_submission(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    let payload: ManualSubmissionPayload = parse_dual_payload(&headers, &body)?;

    let detection_date = payload
        .detection_date
        .unwrap_or_else(|| clock::today_in(application_state.config.zone_offset));

    let raw_record = RawFeedRecord {
        ip_text: payload.ip.clone(),
        detection_date,
        threat_level: payload.threat_level.unwrap_or(ThreatLevel::Unknown),
        country: payload.country,
        description: payload.description,
    };

    let conduit_stats = application_state
        .ingestion_conduit
        .ingest(
            FeedSource::Manual,
            DateRange::new(detection_date, detection_date),
            vec![raw_record],
        )
        .await?;

    if conduit_stats.skipped_invalid > 0 {
        return Err(ApiFault::validation(
            format!("'{}' is not a well-formed address", payload.ip),
            Some("ip"),
        ));
    }

    Ok((StatusCode::CREATED, Json(conduit_stats)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurgePayload {
    pub ip: String,
}

/// POST /api/v2/blacklist/purge: purga de operador (desactiva, no borra).
#[instrument(skip(application_state, headers, body))]
pub async fn handle_purge(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiFault> {
    let payload: PurgePayload = parse_dual_payload(&headers, &body)?;

    let purged = application_state
        .ip_record_repository
        .deactivate(&payload.ip)
        .await?;

    if purged {
        // El conjunto cambió: adoptar la versión sellada por el Ledger.
        let sealed_version = application_state.system_metadata.active_set_version().await?;
        application_state.cache_stratum.bump_version(sealed_version);
    }

    Ok(Json(json!({ "ip": payload.ip, "purged": purged })).into_response())
}

// --- ESTRATO PRIVADO: CONSTRUCCIÓN DE RESPUESTAS ---

fn plain_text_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

fn json_body_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
