// [libs/domain/models/src/run.rs]
/*!
 * =================================================================
 * APARATO: COLLECTION RUN LEDGER MODELS (V9.1)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE CORRIDAS Y ESTADÍSTICAS DE UPSERT
 *
 * # Mathematical Proof (Run Immutability):
 * Una corrida con 'finished_at' sellado es inmutable: las transiciones
 * del Chronos son la única vía de mutación y el sello ocurre
 * exactamente una vez, por lo que el Ledger de corridas actúa como
 * bitácora append-only para el plano de control.
 * =================================================================
 */

use crate::source::FeedSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Máquina de estados de una corrida: pending → running → terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Partial,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw_status: &str) -> Option<Self> {
        match raw_status {
            "pending" => Some(RunStatus::Pending),
            "running" => Some(RunStatus::Running),
            "success" => Some(RunStatus::Success),
            "partial" => Some(RunStatus::Partial),
            "failed" => Some(RunStatus::Failed),
            "cancelled" => Some(RunStatus::Cancelled),
            _ => None,
        }
    }

    /// Estados que sellan la corrida; habilitan el estampado único de finished_at.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Partial | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// Taxonomía de fallo reportada por los adaptadores y el plano de control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    AuthFailed,
    SourceUnavailable,
    ParseError,
    RateLimited,
    /// Corrida no-op de una fuente deshabilitada por configuración.
    Disabled,
}

impl RunErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunErrorKind::AuthFailed => "auth_failed",
            RunErrorKind::SourceUnavailable => "source_unavailable",
            RunErrorKind::ParseError => "parse_error",
            RunErrorKind::RateLimited => "rate_limited",
            RunErrorKind::Disabled => "disabled",
        }
    }

    pub fn parse(raw_kind: &str) -> Option<Self> {
        match raw_kind {
            "auth_failed" => Some(RunErrorKind::AuthFailed),
            "source_unavailable" => Some(RunErrorKind::SourceUnavailable),
            "parse_error" => Some(RunErrorKind::ParseError),
            "rate_limited" => Some(RunErrorKind::RateLimited),
            "disabled" => Some(RunErrorKind::Disabled),
            _ => None,
        }
    }
}

/// Una ejecución de un adaptador, registrada en el Ledger de corridas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRun {
    pub id: String,
    pub source: FeedSource,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub fetched_count: u64,
    pub inserted_count: u64,
    pub updated_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<RunErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// Resultado agregado de un lote transaccional contra el IP Store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertStats {
    pub inserted: u64,
    pub updated: u64,
    pub skipped_invalid: u64,
    pub skipped_duplicate: u64,
}

impl UpsertStats {
    /// Fusión de estadísticas parciales (refinería + transacción del Ledger).
    pub fn absorb(&mut self, other: UpsertStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped_invalid += other.skipped_invalid;
        self.skipped_duplicate += other.skipped_duplicate;
    }
}
