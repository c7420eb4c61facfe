// [libs/domain/models/src/record.rs]
/*!
 * =================================================================
 * APARATO: CANONICAL IP RECORD (V9.2 - ATTRIBUTION SET)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ENTIDAD CANÓNICA DEL CONJUNTO ACTIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATTRIBUTION SET: Una re-detección desde otra fuente extiende el
 *    conjunto 'sources' sin sobrescribir la fuente de primer contacto.
 * 2. SORT KEY: Llave hexadecimal de orden numérico para que el Ledger
 *    pueda servir el listado plano con ORDER BY textual.
 * 3. IMMUTABLE GENESIS: 'detection_date' y 'first_seen' jamás se
 *    sobrescriben tras el alta del registro.
 * =================================================================
 */

use crate::source::FeedSource;
use crate::threat::ThreatLevel;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Entrada canónica y deduplicada del conjunto activo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpRecord {
    /// Dirección en forma textual canónica (v4 sin ceros a la izquierda, v6 RFC 5952).
    pub ip: String,
    /// Fuente del primer contacto. Inmutable tras el alta.
    pub source: FeedSource,
    /// Conjunto de atribución: toda fuente que haya reportado esta dirección.
    pub sources: Vec<FeedSource>,
    /// Fecha de detección reportada por el upstream. Jamás el reloj local.
    pub detection_date: NaiveDate,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub threat_level: ThreatLevel,
    /// ISO-3166-1 alpha-2 cuando el feed lo reporta.
    pub country: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl IpRecord {
    /// Vigencia del registro frente al instante dado.
    pub fn is_live_at(&self, observation_instant: DateTime<Utc>) -> bool {
        self.is_active
            && self
                .expires_at
                .map(|expiry| expiry > observation_instant)
                .unwrap_or(true)
    }
}

/// Proyección de salida con marcas temporales renderizadas en el huso configurado.
/// Es el contrato del endpoint de registros enriquecidos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRecordView {
    pub ip: String,
    pub source: FeedSource,
    pub sources: Vec<FeedSource>,
    pub detection_date: NaiveDate,
    pub first_seen: String,
    pub last_seen: String,
    pub threat_level: ThreatLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub is_active: bool,
}

impl IpRecordView {
    pub fn project(record: &IpRecord, zone_offset: FixedOffset) -> Self {
        Self {
            ip: record.ip.clone(),
            source: record.source,
            sources: record.sources.clone(),
            detection_date: record.detection_date,
            first_seen: record.first_seen.with_timezone(&zone_offset).to_rfc3339(),
            last_seen: record.last_seen.with_timezone(&zone_offset).to_rfc3339(),
            threat_level: record.threat_level,
            country: record.country.clone(),
            description: record.description.clone(),
            expires_at: record
                .expires_at
                .map(|expiry| expiry.with_timezone(&zone_offset).to_rfc3339()),
            is_active: record.is_active,
        }
    }
}

/// Llave de orden numérico: byte de familia + hexadecimal con relleno fijo.
/// Garantiza que el orden lexicográfico del Ledger coincida con el orden
/// numérico de direcciones (v4 antes que v6).
pub fn numeric_sort_key(address: &IpAddr) -> String {
    match address {
        IpAddr::V4(v4) => format!("4{:08x}", u32::from(*v4)),
        IpAddr::V6(v6) => format!("6{:032x}", u128::from(*v6)),
    }
}
