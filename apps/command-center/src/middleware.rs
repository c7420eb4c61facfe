// [apps/command-center/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE AUTHENTICATION GUARD (V7.3 - DUAL PATH)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VALIDACIÓN DE API KEY Y JWT HS256 DEL OPERADOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL CITIZENSHIP: Acepta la cabecera 'X-API-Key' simétrica o un
 *    bearer JWT HS256 firmado con el secreto del servidor.
 * 2. SIGNATURE DISCIPLINE: El JWT se verifica con firma y expiración;
 *    un payload decodificable sin firma válida es rechazado.
 * 3. READ SHIELD OPCIONAL: Los endpoints de lectura nacen abiertos;
 *    la configuración puede exigirles API key.
 * =================================================================
 */

use crate::fault::ApiFault;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

/// Claims mínimos exigidos al JWT del operador.
#[derive(Debug, Deserialize)]
struct OperatorJwtClaims {
    /// Identidad soberana del operador.
    #[allow(dead_code)]
    sub: String,
    /// Expiración en epoch seconds; la validación la exige.
    #[allow(dead_code)]
    exp: usize,
}

/**
 * Guardia del plano de control: API key o JWT del operador.
 *
 * Sin secreto alguno configurado el plano queda abierto con una
 * advertencia trazada (modo desarrollo).
 */
pub async fn control_guard(
    State(application_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFault> {
    let configuration = &application_state.config;

    if configuration.api_key.is_none() && configuration.jwt_secret.is_none() {
        warn!("⚠️ [CONTROL_GUARD]: No API key nor JWT secret configured. Control plane open (dev mode).");
        return Ok(next.run(request).await);
    }

    // --- ESCENARIO ALFA: API KEY SIMÉTRICA ---
    if let Some(expected_api_key) = &configuration.api_key {
        let presented_api_key = request
            .headers()
            .get("X-API-Key")
            .and_then(|value| value.to_str().ok());

        if presented_api_key == Some(expected_api_key.as_str()) {
            debug!("🔑 [CONTROL_GUARD]: API key accepted.");
            return Ok(next.run(request).await);
        }
    }

    // --- ESCENARIO BETA: JWT HS256 DEL OPERADOR ---
    if let Some(jwt_secret) = &configuration.jwt_secret {
        let bearer_token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if let Some(token_raw) = bearer_token {
            let validation = Validation::new(Algorithm::HS256);
            match decode::<OperatorJwtClaims>(
                token_raw,
                &DecodingKey::from_secret(jwt_secret.as_bytes()),
                &validation,
            ) {
                Ok(verified_token) => {
                    debug!("👤 [CONTROL_GUARD]: Operator {} authenticated via JWT.", verified_token.claims.sub);
                    return Ok(next.run(request).await);
                }
                Err(signature_fault) => {
                    warn!("❌ [CONTROL_GUARD]: JWT rejected: {}", signature_fault);
                }
            }
        }
    }

    Err(ApiFault::unauthorized())
}

/**
 * Escudo opcional de lectura: exige API key solo cuando la
 * configuración lo ordena; en caso contrario es transparente.
 */
pub async fn read_guard(
    State(application_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFault> {
    let configuration = &application_state.config;

    if !configuration.read_endpoints_require_key {
        return Ok(next.run(request).await);
    }

    let Some(expected_api_key) = &configuration.api_key else {
        return Ok(next.run(request).await);
    };

    let presented_api_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|value| value.to_str().ok());

    if presented_api_key == Some(expected_api_key.as_str()) {
        Ok(next.run(request).await)
    } else {
        Err(ApiFault::unauthorized())
    }
}
