// [apps/command-center/src/extract.rs]
/*!
 * =================================================================
 * APARATO: DUAL PAYLOAD ADAPTER (V7.0 - CONTENT TYPE SNIFFER)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CUERPOS JSON Y FORM BAJO UN MISMO CONTRATO TIPADO
 *
 * El servidor selecciona el decodificador por Content-Type; ambos
 * caminos cristalizan el mismo struct tipado y los campos
 * desconocidos se rechazan en la capa serde (deny_unknown_fields).
 * =================================================================
 */

use crate::fault::ApiFault;
use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use serde::de::DeserializeOwned;

/**
 * Decodifica un cuerpo de petición según su Content-Type declarado.
 *
 * # Errors:
 * - `ApiFault::validation`: cuerpo malformado o campos desconocidos.
 */
pub fn parse_dual_payload<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<T, ApiFault> {
    let declared_content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if declared_content_type.contains("application/x-www-form-urlencoded") {
        return serde_urlencoded::from_bytes(body)
            .map_err(|fault| ApiFault::validation(format!("form payload rejected: {}", fault), None));
    }

    // JSON es el camino por defecto (incluye Content-Type ausente).
    serde_json::from_slice(body)
        .map_err(|fault| ApiFault::validation(format!("json payload rejected: {}", fault), None))
}
