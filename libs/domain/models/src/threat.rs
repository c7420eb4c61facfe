// [libs/domain/models/src/threat.rs]
/*!
 * =================================================================
 * APARATO: THREAT LEVEL LATTICE (V9.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ORDEN TOTAL DE SEVERIDAD PARA LA POLÍTICA DE MERGE
 *
 * # Mathematical Proof (Merge Monotonicity):
 * El orden derivado Unknown < Low < Medium < High < Critical convierte
 * a 'stricter' en el operador max de un retículo total. max es
 * conmutativo, asociativo e idempotente, por lo que la fusión de
 * severidades es independiente del orden de llegada de los lotes.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severidad reportada por los proveedores upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Operador de fusión: conserva la severidad más estricta.
    pub fn stricter(self, other: ThreatLevel) -> ThreatLevel {
        self.max(other)
    }

    /// Identificador nominal en minúsculas para persistencia y formatos de salida.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Unknown => "unknown",
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        }
    }

    /// Coerción tolerante desde las celdas heterogéneas de los feeds.
    /// Celdas vacías o desconocidas degradan a 'Unknown', nunca a error.
    pub fn coerce(raw_cell: &str) -> ThreatLevel {
        match raw_cell.trim().to_ascii_lowercase().as_str() {
            "low" | "낮음" | "1" => ThreatLevel::Low,
            "medium" | "mid" | "보통" | "2" => ThreatLevel::Medium,
            "high" | "높음" | "3" => ThreatLevel::High,
            "critical" | "심각" | "4" => ThreatLevel::Critical,
            _ => ThreatLevel::Unknown,
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
