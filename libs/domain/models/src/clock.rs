// [libs/domain/models/src/clock.rs]
/*!
 * =================================================================
 * APARATO: TEMPORAL STRATA UTILITIES (V9.0 - KST ANCHORED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: HUSOS HORARIOS FIJOS Y VENTANAS DE RECOLECCIÓN
 * =================================================================
 */

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Desplazamiento fijo de Corea (KST no observa horario de verano).
pub const KST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Huso horario por defecto del sistema (Asia/Seoul).
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECONDS).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

/// Resuelve el nombre de zona de la variable TIMEZONE a un offset fijo.
/// Las zonas operativas del pipeline no observan DST; la tabla es cerrada.
pub fn offset_for_zone(zone_identifier: &str) -> Option<FixedOffset> {
    match zone_identifier.trim() {
        "Asia/Seoul" | "KST" => FixedOffset::east_opt(KST_OFFSET_SECONDS),
        "UTC" | "Etc/UTC" => FixedOffset::east_opt(0),
        "Asia/Tokyo" | "JST" => FixedOffset::east_opt(9 * 3600),
        _ => None,
    }
}

/// Fecha civil actual bajo el huso configurado.
pub fn today_in(zone_offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&zone_offset).date_naive()
}

/// Renderiza una marca UTC en el huso configurado (RFC 3339).
pub fn render_in(timestamp: DateTime<Utc>, zone_offset: FixedOffset) -> String {
    timestamp.with_timezone(&zone_offset).to_rfc3339()
}

/// Ancla una fecha civil del feed a la medianoche del huso configurado,
/// expresada en UTC. Es la conversión fecha → instante de la refinería.
pub fn date_to_instant(civil_date: NaiveDate, zone_offset: FixedOffset) -> DateTime<Utc> {
    let midnight = civil_date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match midnight.and_local_timezone(zone_offset) {
        chrono::LocalResult::Single(anchored) => anchored.with_timezone(&Utc),
        // Offsets fijos no producen ambigüedad; el brazo existe por contrato de chrono.
        _ => DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc),
    }
}

/// Ventana de recolección solicitada a un adaptador upstream (fechas civiles, inclusivas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Ventana por defecto de una corrida periódica: ayer y hoy bajo el huso dado.
    pub fn rolling_daily(zone_offset: FixedOffset) -> Self {
        let today = today_in(zone_offset);
        Self {
            start: today - Duration::days(1),
            end: today,
        }
    }

    /// Pertenencia con tolerancia de ±N días, usada por el filtro de ingesta.
    pub fn contains_with_tolerance(&self, candidate_date: NaiveDate, tolerance_days: i64) -> bool {
        let lower_bound = self.start - Duration::days(tolerance_days);
        let upper_bound = self.end + Duration::days(tolerance_days);
        candidate_date >= lower_bound && candidate_date <= upper_bound
    }
}
