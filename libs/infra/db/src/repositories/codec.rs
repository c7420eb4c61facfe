// [libs/infra/db/src/repositories/codec.rs]
/*!
 * =================================================================
 * APARATO: LEDGER TEMPORAL CODEC (V12.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CODIFICACIÓN RFC 3339 DE ANCHO FIJO
 *
 * Las marcas se persisten en UTC con sufijo 'Z' y segundos enteros,
 * de modo que la comparación lexicográfica del motor SQL coincide con
 * el orden cronológico.
 * =================================================================
 */

use crate::errors::DbError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Serializa un instante UTC en forma fija "YYYY-MM-DDTHH:MM:SSZ".
pub fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Rehidrata un instante del Ledger.
pub fn decode_instant(raw_text: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw_text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|fault| DbError::MappingError(format!("TIMESTAMP_MALFORMED [{}]: {}", raw_text, fault)))
}

/// Serializa una fecha civil en forma "YYYY-MM-DD".
pub fn encode_date(civil_date: NaiveDate) -> String {
    civil_date.format("%Y-%m-%d").to_string()
}

/// Rehidrata una fecha civil del Ledger.
pub fn decode_date(raw_text: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw_text, "%Y-%m-%d")
        .map_err(|fault| DbError::MappingError(format!("DATE_MALFORMED [{}]: {}", raw_text, fault)))
}
