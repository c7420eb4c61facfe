// [libs/domain/ingest/src/refinery.rs]
/*!
 * =================================================================
 * APARATO: BATCH REFINERY ENGINE (V5.2 - MERGE LAWS SEALED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: VALIDACIÓN, CANONICALIZACIÓN Y DEDUP INTRA-LOTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MALFORMED GUARD: Toda dirección malformada se descarta y se contabiliza;
 *    jamás contamina el Ledger Táctico.
 * 2. CANONICAL FORM: v4 en dotted-quad sin ceros a la izquierda, v6
 *    según RFC 5952 (el Display de std ya emite la forma canónica).
 * 3. WINDOW TOLERANCE: El filtro de ventana admite ±1 día civil para
 *    absorber el desfase de husos del upstream.
 *
 * # Mathematical Proof (Permutation Invariance):
 * La fusión intra-lote usa exclusivamente operadores max/min sobre
 * retículos totales (severidad, fechas). max y min son conmutativos,
 * asociativos e idempotentes, por lo que cualquier permutación del
 * lote de entrada cristaliza el mismo registro refinado.
 * =================================================================
 */

use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::record::numeric_sort_key;
use blacklist_domain_models::threat::ThreatLevel;
use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

/// Tolerancia civil del filtro de ventana (±1 día).
const WINDOW_TOLERANCE_DAYS: i64 = 1;

/// Registro ya canónico, deduplicado dentro de su lote y listo para el upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedRecord {
    /// Forma textual canónica de la dirección.
    pub ip: String,
    /// Llave de orden numérico para el ORDER BY del Ledger.
    pub sort_key: String,
    /// Detección más temprana observada dentro del lote.
    pub earliest_detection: NaiveDate,
    /// Detección más tardía observada dentro del lote.
    pub latest_detection: NaiveDate,
    pub threat_level: ThreatLevel,
    pub country: Option<String>,
    pub description: Option<String>,
}

/// Resultado de la refinería: registros cristalizados + contabilidad de descartes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinedBatch {
    pub records: Vec<RefinedRecord>,
    pub skipped_invalid: u64,
    pub skipped_duplicate: u64,
}

/// Canonicaliza una dirección candidata.
///
/// Retorna la forma canónica y la llave de orden, o None si la dirección está malformada.
/// std rechaza dotted-quads con ceros a la izquierda y renderiza v6 en
/// la forma comprimida de RFC 5952, por lo que parse + Display es la
/// canonicalización completa.
pub fn canonicalize_ip(raw_address: &str) -> Option<(String, String)> {
    let parsed_address: IpAddr = raw_address.trim().parse().ok()?;
    Some((parsed_address.to_string(), numeric_sort_key(&parsed_address)))
}

/// Motor de refinado de un lote crudo contra una ventana de recolección.
pub struct BatchRefinery {
    collection_window: DateRange,
}

impl BatchRefinery {
    pub fn new(collection_window: DateRange) -> Self {
        Self { collection_window }
    }

    /// Ejecuta las fases 1-3 del pipeline de ingesta sobre un lote crudo:
    /// filtro de forma + ventana, canonicalización y fusión intra-lote.
    pub fn refine(&self, raw_batch: Vec<RawFeedRecord>) -> RefinedBatch {
        let mut skipped_invalid: u64 = 0;
        let mut accepted_rows: u64 = 0;

        // BTreeMap para una salida determinista ordenada por llave numérica.
        let mut merged_by_sort_key: BTreeMap<String, RefinedRecord> = BTreeMap::new();

        for raw_record in raw_batch {
            // --- FASE 1: VALIDACIÓN DE FORMA Y VENTANA ---
            let Some((canonical_address, sort_key)) = canonicalize_ip(&raw_record.ip_text) else {
                skipped_invalid += 1;
                debug!("🚫 [REFINERY]: Discarded malformed address [{}].", raw_record.ip_text);
                continue;
            };

            if !self
                .collection_window
                .contains_with_tolerance(raw_record.detection_date, WINDOW_TOLERANCE_DAYS)
            {
                skipped_invalid += 1;
                debug!(
                    "🚫 [REFINERY]: Discarded [{}] outside window ({}).",
                    canonical_address, raw_record.detection_date
                );
                continue;
            }

            accepted_rows += 1;

            // --- FASE 2/3: FUSIÓN INTRA-LOTE (max severidad, min/max fechas) ---
            match merged_by_sort_key.entry(sort_key.clone()) {
                Entry::Occupied(mut occupied_slot) => {
                    let existing = occupied_slot.get_mut();
                    existing.threat_level = existing.threat_level.stricter(raw_record.threat_level);
                    existing.earliest_detection =
                        existing.earliest_detection.min(raw_record.detection_date);
                    existing.latest_detection =
                        existing.latest_detection.max(raw_record.detection_date);
                    if existing.country.is_none() {
                        existing.country = raw_record.country;
                    }
                    if existing.description.is_none() {
                        existing.description = raw_record.description;
                    }
                }
                Entry::Vacant(vacant_slot) => {
                    vacant_slot.insert(RefinedRecord {
                        ip: canonical_address,
                        sort_key,
                        earliest_detection: raw_record.detection_date,
                        latest_detection: raw_record.detection_date,
                        threat_level: raw_record.threat_level,
                        country: raw_record.country,
                        description: raw_record.description,
                    });
                }
            }
        }

        let skipped_duplicate = accepted_rows - merged_by_sort_key.len() as u64;

        RefinedBatch {
            records: merged_by_sort_key.into_values().collect(),
            skipped_invalid,
            skipped_duplicate,
        }
    }
}
