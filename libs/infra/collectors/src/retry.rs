// [libs/infra/collectors/src/retry.rs]
/*!
 * =================================================================
 * APARATO: TRANSIENT RETRY ENGINE (V8.1 - SIX ATTEMPT CAP)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: REINTENTOS CON BACKOFF EXPONENCIAL ACOTADO
 *
 * # Mathematical Proof (Bounded Retry Window):
 * Con base 500ms y duplicación por intento, el presupuesto total de
 * espera es 500ms * (2^5 - 1) = 15.5s, independiente de los timeouts
 * por petición (30s total / 10s connect) que porta el cliente.
 * =================================================================
 */

use crate::contract::CollectorError;
use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Tope de intentos ante fallos transitorios (red / 5xx).
pub const MAX_FETCH_ATTEMPTS: u32 = 6;
/// Base del backoff exponencial.
const BACKOFF_BASE_MILLISECONDS: u64 = 500;

/**
 * Ejecuta una descarga con reintentos ante fallos transitorios.
 *
 * Un status 4xx NO es transitorio: la respuesta se retorna intacta
 * para que el adaptador clasifique (401 → auth, 429 → throttling).
 *
 * # Errors:
 * - `CollectorError::SourceUnavailable`: red o 5xx tras agotar el tope.
 */
pub async fn fetch_with_backoff<F, Fut>(
    operation_label: &str,
    mut dispatch_attempt: F,
) -> Result<Response, CollectorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut last_fault_detail = String::new();

    for attempt_index in 1..=MAX_FETCH_ATTEMPTS {
        match dispatch_attempt().await {
            Ok(response) if response.status().is_server_error() => {
                last_fault_detail = format!("HTTP_{}", response.status().as_u16());
                warn!(
                    "⚠️ [RETRY]: [{}] attempt {}/{} rejected with {}.",
                    operation_label, attempt_index, MAX_FETCH_ATTEMPTS, last_fault_detail
                );
            }
            Ok(response) => return Ok(response),
            Err(network_fault) => {
                last_fault_detail = network_fault.to_string();
                warn!(
                    "⚠️ [RETRY]: [{}] attempt {}/{} network fault: {}.",
                    operation_label, attempt_index, MAX_FETCH_ATTEMPTS, last_fault_detail
                );
            }
        }

        if attempt_index < MAX_FETCH_ATTEMPTS {
            let backoff_window =
                Duration::from_millis(BACKOFF_BASE_MILLISECONDS * (1u64 << (attempt_index - 1)));
            debug!("  ↳ Backing off {:?} before next attempt.", backoff_window);
            sleep(backoff_window).await;
        }
    }

    Err(CollectorError::SourceUnavailable(format!(
        "{} exhausted {} attempts: {}",
        operation_label, MAX_FETCH_ATTEMPTS, last_fault_detail
    )))
}
