// [libs/infra/collectors/src/secudium.rs]
/*!
 * =================================================================
 * APARATO: SECUDIUM FEED ADAPTER (V8.2 - FORCED EXPIRE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LOGIN CON DESPLAZAMIENTO DE SESIÓN Y BOLETÍN CSV
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FORCED EXPIRE: El POST de login porta la bandera de expiración
 *    forzada para desplazar una sesión previa colgada del portal.
 * 2. DISABLE CAPABLE: La configuración puede apagar el adaptador; la
 *    corrida resultante es un no-op registrado, jamás un fallo.
 * 3. SINGLE SHEET: El boletín viaja como exporte de hoja de cálculo
 *    en una sola descarga bajo el motor de reintentos.
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
use reqwest::{header, Client, StatusCode};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, instrument};

/// Adaptador del boletín de inteligencia SECUDIUM.
pub struct SecudiumCollector {
    http_client: Client,
    base_endpoint: String,
    /// Bandera de configuración; apagado reporta corrida no-op.
    enabled: bool,
}

impl SecudiumCollector {
    pub fn new(base_endpoint: String, enabled: bool) -> Self {
        Self {
            http_client: Client::builder()
                .cookie_store(true)
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .user_agent("Blacklist-Collector/Secudium-V8")
                .build()
                .expect("FATAL: Secudium network client initialization failed."),
            base_endpoint: base_endpoint.trim_end_matches('/').to_string(),
            enabled,
        }
    }

    /**
     * Login de formulario con expiración forzada de sesión previa.
     * La cookie de sesión se certifica vía Set-Cookie de la respuesta.
     */
    async fn authenticate(
        &self,
        credentials: &UpstreamCredentials,
    ) -> Result<(), CollectorError> {
        let login_url = format!("{}/login/loginProcess", self.base_endpoint);

        let login_response = self
            .http_client
            .post(&login_url)
            .form(&[
                ("login_id", credentials.username.as_str()),
                ("login_pw", credentials.secret.as_str()),
                // Bandera de desplazamiento: una sesión previa queda expirada.
                ("force_login", "Y"),
            ])
            .send()
            .await
            .map_err(|fault| CollectorError::SourceUnavailable(fault.to_string()))?;

        match login_response.status() {
            status if status.is_success() => {
                let session_cookie_present = login_response
                    .headers()
                    .get_all(header::SET_COOKIE)
                    .iter()
                    .next()
                    .is_some();

                if session_cookie_present {
                    info!("🔑 [SECUDIUM_AUTH]: Session displaced and captured for [{}].", credentials.username);
                    Ok(())
                } else {
                    Err(CollectorError::AuthFailed("no session cookie issued".into()))
                }
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
impl FeedCollector for SecudiumCollector {
    fn source(&self) -> FeedSource {
        FeedSource::Secudium
    }

    #[instrument(skip(self, credentials, cancellation_flag), fields(window = ?window))]
    async fn collect(
        &self,
        window: DateRange,
        credentials: &UpstreamCredentials,
        cancellation_flag: &CancellationFlag,
    ) -> Result<CollectorHarvest, CollectorError> {
        if !self.enabled {
            return Err(CollectorError::Disabled);
        }

        self.authenticate(credentials).await?;

        if cancellation_flag.load(Ordering::Acquire) {
            return Err(CollectorError::Cancelled);
        }

        let bulletin_url = format!("{}/board/threat/export", self.base_endpoint);
        let query_parameters = [
            ("start_date", window.start.format("%Y-%m-%d").to_string()),
            ("end_date", window.end.format("%Y-%m-%d").to_string()),
        ];

        let bulletin_response = fetch_with_backoff("secudium_bulletin_export", || {
            self.http_client
                .get(&bulletin_url)
                .query(&query_parameters)
                .send()
        })
        .await?;

        match bulletin_response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CollectorError::AuthFailed("session rejected at export".into()));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(CollectorError::RateLimited("export throttled".into()));
            }
            _ => {}
        }

        let content_type = bulletin_response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bulletin_body = bulletin_response
            .text()
            .await
            .map_err(|fault| CollectorError::SourceUnavailable(fault.to_string()))?;

        let parsed_sheet = parse_payload(content_type.as_deref(), &bulletin_body)?;

        let harvest = CollectorHarvest {
            records: parsed_sheet.records,
            pages_fetched: 1,
            pages_failed: 0,
            rows_discarded: parsed_sheet.discarded,
        };

        info!(
            "📡 [SECUDIUM_HARVEST]: {} records from bulletin ({} discarded rows).",
            harvest.records.len(),
            harvest.rows_discarded
        );
        Ok(harvest)
    }
}
