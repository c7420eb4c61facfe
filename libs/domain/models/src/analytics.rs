// [libs/domain/models/src/analytics.rs]
/*!
 * =================================================================
 * APARATO: SERVING FORMAT CONTRACTS (V9.1 - FORTIGATE READY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DTOs DEL ESTRATO DE CONSULTA Y ANALÍTICA
 * =================================================================
 */

use crate::run::CollectionRun;
use crate::source::FeedSource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ventanas analíticas admitidas por el endpoint de resumen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsWindow {
    Days7,
    Days30,
    Days90,
}

impl AnalyticsWindow {
    pub fn parse(raw_window: &str) -> Option<Self> {
        match raw_window.trim() {
            "7d" => Some(AnalyticsWindow::Days7),
            "30d" => Some(AnalyticsWindow::Days30),
            "90d" => Some(AnalyticsWindow::Days90),
            _ => None,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            AnalyticsWindow::Days7 => 7,
            AnalyticsWindow::Days30 => 30,
            AnalyticsWindow::Days90 => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsWindow::Days7 => "7d",
            AnalyticsWindow::Days30 => "30d",
            AnalyticsWindow::Days90 => "90d",
        }
    }
}

/// Conteo de detecciones por día civil dentro de la ventana.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub day: NaiveDate,
    pub count: u64,
}

/// Resumen analítico del conjunto activo sobre una ventana solicitada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub window: String,
    pub generated_at: String,
    pub total_active: u64,
    pub by_source: BTreeMap<String, u64>,
    pub by_threat_level: BTreeMap<String, u64>,
    pub daily_detections: Vec<DailyBucket>,
}

/// Estado por fuente para el endpoint de estatus y el plano de control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRunSummary {
    pub source: FeedSource,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<CollectionRun>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Entrada del conector externo FortiGate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FortigateEntry {
    pub ip: String,
    pub expires_at: String,
}

/// Sobre del conector externo FortiGate. 'ttl_seconds' es el mínimo de
/// vida restante sobre las entradas: el firewall lo usa para programar
/// su re-descarga.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FortigateEnvelope {
    pub version: String,
    pub generated_at: String,
    pub ttl_seconds: i64,
    pub entries: Vec<FortigateEntry>,
}
