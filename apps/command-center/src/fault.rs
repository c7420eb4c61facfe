// [apps/command-center/src/fault.rs]
/*!
 * =================================================================
 * APARATO: USER-VISIBLE FAULT SHAPE (V7.1)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FORMA ÚNICA DE FALLO DEL CONTRATO HTTP
 *
 * Toda respuesta de error del Centro de Mando cristaliza como
 * {"error": {"kind", "message", "field"}}; los detalles internos de
 * persistencia jamás se filtran al consumidor.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blacklist_infra_db::DbError;
use serde_json::json;
use tracing::error;

/// Fallo visible al consumidor con taxonomía cerrada.
#[derive(Debug, Clone)]
pub struct ApiFault {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub field: Option<&'static str>,
}

impl ApiFault {
    pub fn validation(message: impl Into<String>, field: Option<&'static str>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "validation_error",
            message: message.into(),
            field,
        }
    }

    pub fn already_running(source_label: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            kind: "already_running",
            message: format!("a collection run for '{}' is already in flight", source_label),
            field: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            kind: "rate_limited",
            message: message.into(),
            field: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "auth_failed",
            message: "control plane authentication required".into(),
            field: None,
        }
    }

    /// Fallo transitorio del Ledger: 503 con cuerpo mínimo, sin detalle interno.
    pub fn store_unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            kind: "store_unavailable",
            message: "persistence layer temporarily unavailable".into(),
            field: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "validation_error",
            message: message.into(),
            field: None,
        }
    }
}

impl From<DbError> for ApiFault {
    /// El detalle interno viaja al rastro, jamás al consumidor.
    fn from(database_fault: DbError) -> Self {
        match database_fault {
            DbError::RecordNotFound | DbError::RunNotFound => {
                ApiFault::not_found("requested entity does not exist")
            }
            other_fault => {
                error!("💀 [SERVING_FAULT]: Ledger rejected the operation: {}", other_fault);
                ApiFault::store_unavailable()
            }
        }
    }
}

impl IntoResponse for ApiFault {
    fn into_response(self) -> Response {
        let fault_body = json!({
            "error": {
                "kind": self.kind,
                "message": self.message,
                "field": self.field,
            }
        });
        (self.status, Json(fault_body)).into_response()
    }
}
