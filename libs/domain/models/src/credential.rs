// [libs/domain/models/src/credential.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL METADATA MODELS (V9.0 - SECRET FREE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ESPEJO NO-SECRETO DE LA BÓVEDA Y AUDITORÍA AUTH
 *
 * El material secreto vive exclusivamente en la Bóveda cifrada
 * (blacklist-core-vault). Estos modelos transportan únicamente los
 * metadatos publicables en el plano de control.
 * =================================================================
 */

use crate::source::FeedSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Espejo publicable de una cuenta upstream. Sin material secreto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialMetadata {
    pub source: FeedSource,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotated_at: Option<DateTime<Utc>>,
    /// Veredicto de la última sonda de autenticación del adaptador.
    pub valid: bool,
}

/// Fila de auditoría de autenticación; alimenta el candado de cinco strikes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAttempt {
    pub source: FeedSource,
    pub username: String,
    pub when: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
}
