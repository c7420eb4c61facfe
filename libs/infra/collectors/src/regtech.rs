// [libs/infra/collectors/src/regtech.rs]
/*!
 * =================================================================
 * APARATO: REGTECH FEED ADAPTER (V8.4 - BEARER FIRST)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SESIÓN, DESCARGA PAGINADA Y PARSEO DEL PORTAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BEARER FIRST: Si la Bóveda porta un token de larga vida se usa
 *    primero; un 401 o redirección a login cae al formulario de
 *    credenciales sin abortar la corrida.
 * 2. PAGED HARVEST: El reporte administrativo se recorre por páginas
 *    de la ventana solicitada; cada página viaja bajo el motor de
 *    reintentos con backoff acotado a seis intentos.
 * 3. PARTIAL TOLERANCE: Una página que agota reintentos tras cosecha
 *    previa degrada la corrida a parcial en lugar de perderla.
 * =================================================================
 */

use crate::contract::{
    CancellationFlag, CollectorError, CollectorHarvest, FeedCollector, UpstreamCredentials,
};
use crate::parse::parse_payload;
use crate::retry::fetch_with_backoff;
use async_trait::async_trait;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::source::FeedSource;
use reqwest::{Client, StatusCode};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Tamaño nominal de página del reporte administrativo.
const REPORT_PAGE_SIZE: usize = 500;

/// Modo de autenticación negociado al abrir la corrida.
enum AuthMode {
    /// Token de larga vida vigente; viaja como cabecera Authorization.
    Bearer(String),
    /// Cookie de sesión capturada por el cookie store tras el formulario.
    Session,
}

/// Adaptador del portal administrativo regulatorio.
pub struct RegtechCollector {
    http_client: Client,
    base_endpoint: String,
}

impl RegtechCollector {
    /**
     * Inicializa el túnel de red del adaptador.
     *
     * Redirecciones deshabilitadas: un 302 hacia login es señal de
     * sesión expirada y debe clasificarse, no seguirse.
     */
    pub fn new(base_endpoint: String) -> Self {
        Self {
            http_client: Client::builder()
                .cookie_store(true)
                .redirect(reqwest::redirect::Policy::none())
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .user_agent("Blacklist-Collector/Regtech-V8")
                .build()
                .expect("FATAL: Regtech network client initialization failed."),
            base_endpoint: base_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /**
     * Negocia el modo de autenticación: bearer primero, formulario después.
     *
     * # Errors:
     * - `AuthFailed`: ambas vías rechazadas por el upstream.
     * - `RateLimited`: throttling explícito (429) en el login.
     * - `SourceUnavailable`: red caída durante la negociación.
     */
    async fn authenticate(
        &self,
        credentials: &UpstreamCredentials,
    ) -> Result<AuthMode, CollectorError> {
        // --- VÍA ALFA: TOKEN DE LARGA VIDA ---
        if let Some(bearer_token) = &credentials.bearer_token {
            let probe_url = format!("{}/api/session/verify", self.base_endpoint);
            let probe_response = self
                .http_client
                .get(&probe_url)
                .bearer_auth(bearer_token)
                .send()
                .await
                .map_err(|fault| CollectorError::SourceUnavailable(fault.to_string()))?;

            if probe_response.status().is_success() {
                info!("🔑 [REGTECH_AUTH]: Long-lived bearer accepted.");
                return Ok(AuthMode::Bearer(bearer_token.clone()));
            }

            // 401 o redirección a login: el token expiró; caída a credenciales.
            warn!(
                "🔑 [REGTECH_AUTH]: Bearer rejected ({}). Falling back to form login.",
                probe_response.status()
            );
        }

        // --- VÍA BETA: FORMULARIO DE CREDENCIALES ---
        let login_url = format!("{}/auth/login", self.base_endpoint);
        let login_response = self
            .http_client
            .post(&login_url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.secret.as_str()),
            ])
            .send()
            .await
            .map_err(|fault| CollectorError::SourceUnavailable(fault.to_string()))?;

        match login_response.status() {
            status if status.is_success() || status.is_redirection() => {
                // La cookie de sesión quedó capturada en el cookie store.
                info!("🔑 [REGTECH_AUTH]: Session established for [{}].", credentials.username);
                Ok(AuthMode::Session)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(CollectorError::RateLimited(
                "login throttled by upstream".into(),
            )),
            status => Err(CollectorError::AuthFailed(format!(
                "login rejected with HTTP_{}",
                status.as_u16()
            ))),
        }
    }
}

#[async_trait]
impl FeedCollector for RegtechCollector {
    fn source(&self) -> FeedSource {
        FeedSource::Regtech
    }

    #[instrument(skip(self, credentials, cancellation_flag), fields(window = ?window))]
    async fn collect(
        &self,
        window: DateRange,
        credentials: &UpstreamCredentials,
        cancellation_flag: &CancellationFlag,
    ) -> Result<CollectorHarvest, CollectorError> {
        let auth_mode = self.authenticate(credentials).await?;

        let report_url = format!("{}/api/blacklist/report", self.base_endpoint);
        let mut harvest = CollectorHarvest::default();
        let mut page_number: u32 = 1;

        loop {
            // Cancelación cooperativa: consultada antes de cada descarga.
            if cancellation_flag.load(Ordering::Acquire) {
                return Err(CollectorError::Cancelled);
            }

            let query_parameters = [
                ("start_date", window.start.format("%Y-%m-%d").to_string()),
                ("end_date", window.end.format("%Y-%m-%d").to_string()),
                ("page", page_number.to_string()),
                ("size", REPORT_PAGE_SIZE.to_string()),
            ];

            let page_response = match fetch_with_backoff("regtech_report_page", || {
                let page_request = self.http_client.get(&report_url).query(&query_parameters);
                let page_request = match &auth_mode {
                    AuthMode::Bearer(token) => page_request.bearer_auth(token),
                    AuthMode::Session => page_request,
                };
                page_request.send()
            })
            .await
            {
                Ok(response) => response,
                Err(transport_fault) => {
                    if harvest.pages_fetched == 0 {
                        return Err(transport_fault);
                    }
                    // Cosecha previa existente: la corrida degrada a parcial.
                    harvest.pages_failed += 1;
                    warn!("⚠️ [REGTECH_FETCH]: Page {} lost after retries. Harvest partial.", page_number);
                    break;
                }
            };

            match page_response.status() {
                // Una redirección a login equivale a sesión desplazada.
                status if status.is_redirection() => {
                    return Err(CollectorError::AuthFailed(format!(
                        "redirected to login at page {}",
                        page_number
                    )));
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(CollectorError::AuthFailed(format!(
                        "session displaced at page {}",
                        page_number
                    )));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(CollectorError::RateLimited(format!(
                        "throttled at page {}",
                        page_number
                    )));
                }
                _ => {}
            }

            let content_type = page_response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string());

            let page_body = page_response
                .text()
                .await
                .map_err(|fault| CollectorError::SourceUnavailable(fault.to_string()))?;

            let parsed_page = parse_payload(content_type.as_deref(), &page_body)?;
            let page_row_count = parsed_page.records.len() as u64 + parsed_page.discarded;

            harvest.pages_fetched += 1;
            harvest.rows_discarded += parsed_page.discarded;
            harvest.records.extend(parsed_page.records);

            // Última página: el reporte emitió menos filas que el tamaño nominal.
            if (page_row_count as usize) < REPORT_PAGE_SIZE {
                break;
            }
            page_number += 1;
        }

        info!(
            "📡 [REGTECH_HARVEST]: {} records over {} pages ({} discarded rows).",
            harvest.records.len(),
            harvest.pages_fetched,
            harvest.rows_discarded
        );
        Ok(harvest)
    }
}
