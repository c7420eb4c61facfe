// [libs/infra/collectors/src/stub.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC STUB COLLECTOR (V8.1 - PROVING GROUNDS)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ADAPTADOR GUIONADO PARA AUDITORÍAS DE EXTREMO A EXTREMO
 *
 * Sustituye a un upstream real en el Proving Grounds: entrega cosechas
 * o fallos según un guion FIFO, con caída a una cosecha estable cuando
 * el guion se agota. Honra el contrato de cancelación cooperativa.
 * =================================================================
 */

use crate::contract::{
    CancellationFlag, CollectorError, CollectorHarvest, FeedCollector, UpstreamCredentials,
};
use async_trait::async_trait;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::feed::RawFeedRecord;
use blacklist_domain_models::source::FeedSource;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

/// Adaptador guionado del Proving Grounds.
pub struct StubCollector {
    represented_source: FeedSource,
    scripted_outcomes: Mutex<VecDeque<Result<Vec<RawFeedRecord>, CollectorError>>>,
    steady_yield: Vec<RawFeedRecord>,
}

impl StubCollector {
    /// Cosecha estable: toda corrida entrega el mismo lote.
    pub fn steady(represented_source: FeedSource, steady_yield: Vec<RawFeedRecord>) -> Self {
        Self {
            represented_source,
            scripted_outcomes: Mutex::new(VecDeque::new()),
            steady_yield,
        }
    }

    /// Guion FIFO de resultados; al agotarse cae a la cosecha estable vacía.
    pub fn scripted(
        represented_source: FeedSource,
        outcomes: Vec<Result<Vec<RawFeedRecord>, CollectorError>>,
    ) -> Self {
        Self {
            represented_source,
            scripted_outcomes: Mutex::new(outcomes.into()),
            steady_yield: Vec::new(),
        }
    }

    /// Encola un resultado adicional al guion.
    pub fn push_outcome(&self, outcome: Result<Vec<RawFeedRecord>, CollectorError>) {
        if let Ok(mut script_guard) = self.scripted_outcomes.lock() {
            script_guard.push_back(outcome);
        }
    }
}

#[async_trait]
impl FeedCollector for StubCollector {
    fn source(&self) -> FeedSource {
        self.represented_source
    }

    async fn collect(
        &self,
        _window: DateRange,
        _credentials: &UpstreamCredentials,
        cancellation_flag: &CancellationFlag,
    ) -> Result<CollectorHarvest, CollectorError> {
        if cancellation_flag.load(Ordering::Acquire) {
            return Err(CollectorError::Cancelled);
        }

        let next_outcome = self
            .scripted_outcomes
            .lock()
            .ok()
            .and_then(|mut script_guard| script_guard.pop_front());

        let records = match next_outcome {
            Some(Ok(scripted_records)) => scripted_records,
            Some(Err(scripted_fault)) => return Err(scripted_fault),
            None => self.steady_yield.clone(),
        };

        Ok(CollectorHarvest {
            records,
            pages_fetched: 1,
            pages_failed: 0,
            rows_discarded: 0,
        })
    }
}
