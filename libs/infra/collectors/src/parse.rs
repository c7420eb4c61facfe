// [libs/infra/collectors/src/parse.rs]
/*!
 * =================================================================
 * APARATO: PAYLOAD PARSING ENGINE (V8.3 - DUAL FORMAT)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: EXTRACCIÓN DE FILAS DESDE HTML-TABLE Y CSV
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SOURCE DATE ONLY: La fecha de detección proviene de la celda del
 *    feed. Una fila sin fecha coercionable se descarta y contabiliza;
 *    el reloj local jamás la sustituye.
 * 2. FORMAT SNIFFING: El despacho usa el Content-Type y, en su
 *    ausencia, la firma del cuerpo ('<' inicial → HTML).
 * 3. ROW TOLERANCE: Filas rotas individuales degradan la cosecha a
 *    parcial; solo un payload sin ninguna fila recuperable es
 *    ParseError.
 * =================================================================
 */

use crate::contract::CollectorError;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::threat::ThreatLevel;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use tracing::debug;

/// Resultado del parseo de un payload: filas + contabilidad de descartes.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub records: Vec<RawFeedRecord>,
    pub discarded: u64,
}

/// Formatos de fecha observados en los feeds upstream.
const FEED_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d"];

/// Coerción tolerante de la celda de fecha del feed.
pub fn coerce_detection_date(raw_cell: &str) -> Option<NaiveDate> {
    let trimmed_cell = raw_cell.trim();
    if trimmed_cell.is_empty() {
        return None;
    }

    // Celdas datetime: nos quedamos con el prefijo de fecha.
    let date_prefix = trimmed_cell.split_whitespace().next().unwrap_or(trimmed_cell);

    for format in FEED_DATE_FORMATS {
        if let Ok(parsed_date) = NaiveDate::parse_from_str(date_prefix, format) {
            return Some(parsed_date);
        }
    }
    None
}

/**
 * Despacho maestro: selecciona el motor según el Content-Type reportado
 * o la firma del cuerpo.
 *
 * # Errors:
 * - `CollectorError::ParseError`: payload sin ninguna fila recuperable.
 */
pub fn parse_payload(
    content_type: Option<&str>,
    payload_body: &str,
) -> Result<ParsedRows, CollectorError> {
    let looks_like_html = content_type
        .map(|declared| declared.contains("text/html"))
        .unwrap_or_else(|| payload_body.trim_start().starts_with('<'));

    let parsed = if looks_like_html {
        parse_html_table(payload_body)
    } else {
        parse_spreadsheet(payload_body)
    }?;

    if parsed.records.is_empty() && parsed.discarded > 0 {
        return Err(CollectorError::ParseError(format!(
            "no recoverable rows ({} discarded)",
            parsed.discarded
        )));
    }
    Ok(parsed)
}

/**
 * Extrae filas de un reporte HTML-table. La primera columna porta la
 * dirección y la segunda la fecha de detección; severidad, país y
 * descripción son posicionales opcionales.
 */
pub fn parse_html_table(html_body: &str) -> Result<ParsedRows, CollectorError> {
    let parsed_document = Html::parse_document(html_body);
    let row_selector = Selector::parse("table tr")
        .map_err(|_| CollectorError::ParseError("row selector rejected".into()))?;
    let cell_selector = Selector::parse("td")
        .map_err(|_| CollectorError::ParseError("cell selector rejected".into()))?;

    let mut parsed = ParsedRows::default();

    for table_row in parsed_document.select(&row_selector) {
        let cells: Vec<String> = table_row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        // Filas de cabecera (th) producen cero celdas td; se ignoran sin contabilizar.
        if cells.is_empty() {
            continue;
        }

        match assemble_record(&cells) {
            Some(record) => parsed.records.push(record),
            None => {
                parsed.discarded += 1;
                debug!("🚫 [PARSE]: HTML row discarded: {:?}", cells.first());
            }
        }
    }

    Ok(parsed)
}

/**
 * Extrae filas de un exporte de hoja de cálculo (CSV). Mapea columnas
 * por cabecera cuando existe, con caída posicional.
 */
pub fn parse_spreadsheet(csv_body: &str) -> Result<ParsedRows, CollectorError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_body.as_bytes());

    // Índices por cabecera; caída posicional [ip, fecha, severidad, país, descripción].
    let mut header_index = |candidates: &[&str], fallback: usize| -> usize {
        csv_reader
            .headers()
            .ok()
            .and_then(|headers| {
                headers.iter().position(|header| {
                    let normalized = header.trim().to_ascii_lowercase();
                    candidates.iter().any(|candidate| normalized.contains(candidate))
                })
            })
            .unwrap_or(fallback)
    };

    let ip_column = header_index(&["ip", "address", "주소"], 0);
    let date_column = header_index(&["date", "detect", "일자"], 1);
    let level_column = header_index(&["level", "threat", "severity", "등급"], 2);
    let country_column = header_index(&["country", "국가"], 3);
    let description_column = header_index(&["desc", "비고", "내용"], 4);

    let mut parsed = ParsedRows::default();

    for row_result in csv_reader.records() {
        let data_row = match row_result {
            Ok(row) => row,
            Err(_) => {
                parsed.discarded += 1;
                continue;
            }
        };

        let cell_at = |column: usize| data_row.get(column).map(str::trim).unwrap_or("");

        let cells = vec![
            cell_at(ip_column).to_string(),
            cell_at(date_column).to_string(),
            cell_at(level_column).to_string(),
            cell_at(country_column).to_string(),
            cell_at(description_column).to_string(),
        ];

        match assemble_record(&cells) {
            Some(record) => parsed.records.push(record),
            None => parsed.discarded += 1,
        }
    }

    Ok(parsed)
}

/// Ensambla una fila cruda desde celdas posicionales [ip, fecha, nivel, país, descripción].
/// Retorna None si la dirección está vacía o la fecha no coerciona.
fn assemble_record(cells: &[String]) -> Option<RawFeedRecord> {
    let ip_cell = cells.first()?.trim();
    if ip_cell.is_empty() {
        return None;
    }

    let detection_date = coerce_detection_date(cells.get(1)?)?;

    let threat_level = cells
        .get(2)
        .map(|cell| ThreatLevel::coerce(cell))
        .unwrap_or(ThreatLevel::Unknown);

    let country = cells
        .get(3)
        .map(|cell| cell.trim().to_uppercase())
        .filter(|cell| cell.len() == 2);

    let description = cells
        .get(4)
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty());

    Some(RawFeedRecord {
        ip_text: ip_cell.to_string(),
        detection_date,
        threat_level,
        country,
        description,
    })
}
