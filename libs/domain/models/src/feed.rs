// [libs/domain/models/src/feed.rs]
/*!
 * =================================================================
 * APARATO: RAW FEED CONTRACT (V9.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO UNIFORME ADAPTADOR → REFINERÍA
 * =================================================================
 */

use crate::threat::ThreatLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fila cruda emitida por un adaptador tras el parseo del payload upstream.
/// La dirección viaja sin canonicalizar; la refinería decide su destino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeedRecord {
    pub ip_text: String,
    /// Fecha de detección extraída de la celda del feed. Jamás el reloj local.
    pub detection_date: NaiveDate,
    pub threat_level: ThreatLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
