// [libs/domain/models/src/source.rs]
/*!
 * =================================================================
 * APARATO: FEED SOURCE TAXONOMY (V9.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CLASIFICACIÓN NOMINAL DE PROVEEDORES UPSTREAM
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proveedores de inteligencia reconocidos por el pipeline.
///
/// El orden de los variantes es estable: se utiliza para la
/// serialización determinista del conjunto de atribución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// Portal administrativo regulatorio (reporte paginado, sesión + bearer).
    Regtech,
    /// Boletín de inteligencia SECUDIUM (descarga de hoja de cálculo).
    Secudium,
    /// Altas manuales del operador vía Centro de Mando.
    Manual,
}

impl FeedSource {
    /// Identificador nominal en minúsculas, idéntico al formato de persistencia.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::Regtech => "regtech",
            FeedSource::Secudium => "secudium",
            FeedSource::Manual => "manual",
        }
    }

    /// Decodifica el identificador textual del Ledger o de la URL de trigger.
    pub fn parse(raw_identifier: &str) -> Option<Self> {
        match raw_identifier.trim().to_ascii_lowercase().as_str() {
            "regtech" => Some(FeedSource::Regtech),
            "secudium" => Some(FeedSource::Secudium),
            "manual" => Some(FeedSource::Manual),
            _ => None,
        }
    }

    /// Fuentes con adaptador de recolección automática (excluye altas manuales).
    pub fn collectable() -> [FeedSource; 2] {
        [FeedSource::Regtech, FeedSource::Secudium]
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
