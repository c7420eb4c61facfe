// [apps/command-center/src/services/chronos.rs]
/*!
 * =================================================================
 * APARATO: CHRONOS COLLECTION SCHEDULER (V9.5 - EXCLUSION SEALED)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: DESPACHO PERIÓDICO Y BAJO DEMANDA DE CORRIDAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE FLIGHT: A lo sumo una corrida en vuelo por fuente; el
 *    segundo trigger colisiona con 'already_running', jamás se encola.
 * 2. GLOBAL CAP: Un semáforo acota el total de corridas concurrentes
 *    del enjambre de adaptadores (techo por defecto: 2).
 * 3. BACKOFF: Tras un fallo, la siguiente corrida automática se
 *    retrasa min(base * 2^fallos, tope); éxito o parcial resetean.
 * 4. FIVE STRIKES: El candado de autenticación se consulta antes de
 *    reservar el slot; una fuente bloqueada colisiona con
 *    'rate_limited' sin crear corrida.
 * 5. COOPERATIVE CANCEL: La bandera se iza para el adaptador; tras la
 *    ventana de gracia la corrida se abandona sellada como
 *    'cancelled' sin comprometer lote alguno.
 * =================================================================
 */

use crate::config::SystemConfig;
use crate::services::conduit::IngestionConduit;
use blacklist_core_vault::CredentialVault;
use blacklist_domain_models::clock::DateRange;
use blacklist_domain_models::credential::AuthAttempt;
use blacklist_domain_models::run::{RunErrorKind, RunStatus, UpsertStats};
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_collectors::contract::{
    CancellationFlag, CollectorError, FeedCollector, UpstreamCredentials,
};
use blacklist_infra_db::repositories::{
    AuthAttemptRepository, CollectionRunRepository, CredentialRegistryRepository,
    SystemMetadataRepository,
};
use blacklist_infra_db::DbError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

/// Base del backoff post-fallo (5 minutos).
const BACKOFF_BASE_MINUTES: i64 = 5;
/// Tope del backoff post-fallo (2 horas).
const BACKOFF_CAP_MINUTES: i64 = 120;
/// Ventana de gracia de una cancelación cooperativa (30 segundos).
const CANCELLATION_GRACE_SECONDS: u64 = 30;
/// Cadencia del marcapasos periódico.
const PACEMAKER_TICK_SECONDS: u64 = 60;

#[derive(Error, Debug)]
pub enum SchedulerFault {
    /// Ya existe una corrida en vuelo para la fuente.
    #[error("[L4_CHRONOS_FAULT]: RUN_ALREADY_IN_FLIGHT")]
    AlreadyRunning,

    /// El candado de cinco strikes está activo para la fuente.
    #[error("[L4_CHRONOS_FAULT]: SOURCE_LOCKED_OUT -> {0}")]
    RateLimited(String),

    /// La recolección está apagada globalmente (kill switch / override).
    #[error("[L4_CHRONOS_FAULT]: COLLECTION_GLOBALLY_DISABLED")]
    CollectionDisabled,

    /// La fuente no tiene adaptador registrado.
    #[error("[L4_CHRONOS_FAULT]: SOURCE_WITHOUT_ADAPTER -> {0}")]
    UnknownSource(String),

    /// Colapso del Ledger al reservar o sellar la corrida.
    #[error(transparent)]
    Ledger(#[from] DbError),
}

/// Corrida en vuelo registrada en el slot de la fuente.
struct ActiveJob {
    run_identifier: String,
    cancellation_flag: CancellationFlag,
}

/// Estado de agenda por fuente.
struct SourceSchedule {
    enabled: bool,
    interval: ChronoDuration,
    consecutive_failures: u32,
    next_run_at: DateTime<Utc>,
    active_job: Option<ActiveJob>,
}

/// Proyección del estado de agenda para el plano de control.
#[derive(Debug, Clone, Serialize)]
pub struct SourceScheduleView {
    pub source: FeedSource,
    pub enabled: bool,
    pub in_flight: bool,
    pub consecutive_failures: u32,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Scheduler soberano de corridas de recolección.
pub struct ChronosScheduler {
    collectors: HashMap<FeedSource, Arc<dyn FeedCollector>>,
    schedules: Mutex<HashMap<FeedSource, SourceSchedule>>,
    dispatch_semaphore: Arc<Semaphore>,
    conduit: Arc<IngestionConduit>,
    run_ledger: Arc<CollectionRunRepository>,
    credential_registry: Arc<CredentialRegistryRepository>,
    auth_audit: Arc<AuthAttemptRepository>,
    system_metadata: Arc<SystemMetadataRepository>,
    vault: Arc<CredentialVault>,
    config: Arc<SystemConfig>,
}

impl ChronosScheduler {
    /**
     * Forja el scheduler hidratando las banderas de agenda persistidas.
     * REGTECH nace habilitado; SECUDIUM hereda la bandera de entorno.
     */
    pub async fn ignite(
        collectors: HashMap<FeedSource, Arc<dyn FeedCollector>>,
        conduit: Arc<IngestionConduit>,
        run_ledger: Arc<CollectionRunRepository>,
        credential_registry: Arc<CredentialRegistryRepository>,
        auth_audit: Arc<AuthAttemptRepository>,
        system_metadata: Arc<SystemMetadataRepository>,
        vault: Arc<CredentialVault>,
        config: Arc<SystemConfig>,
    ) -> Arc<Self> {
        let mut schedules = HashMap::new();

        for source in FeedSource::collectable() {
            let default_enabled = match source {
                FeedSource::Regtech => true,
                FeedSource::Secudium => config.secudium_enabled,
                FeedSource::Manual => false,
            };

            // La bandera sellada por el operador prevalece sobre el default.
            let persisted_flag = system_metadata
                .schedule_flag(source)
                .await
                .ok()
                .flatten();

            schedules.insert(
                source,
                SourceSchedule {
                    enabled: persisted_flag.unwrap_or(default_enabled),
                    interval: ChronoDuration::hours(config.regtech_interval_hours),
                    consecutive_failures: 0,
                    next_run_at: Utc::now(),
                    active_job: None,
                },
            );
        }

        Arc::new(Self {
            collectors,
            schedules: Mutex::new(schedules),
            dispatch_semaphore: Arc::new(Semaphore::new(config.global_run_cap)),
            conduit,
            run_ledger,
            credential_registry,
            auth_audit,
            system_metadata,
            vault,
            config,
        })
    }

    /**
     * Trigger de una corrida (periódica o bajo demanda del operador).
     *
     * # Errors:
     * - `SchedulerFault::AlreadyRunning`: slot de la fuente ocupado (409).
     * - `SchedulerFault::RateLimited`: candado de cinco strikes activo (429).
     * - `SchedulerFault::CollectionDisabled`: kill switch global.
     */
    #[instrument(skip(self))]
    pub async fn trigger(
        self: &Arc<Self>,
        source: FeedSource,
        requested_window: Option<DateRange>,
    ) -> Result<String, SchedulerFault> {
        if self.config.force_disable_collection || !self.config.collection_enabled {
            return Err(SchedulerFault::CollectionDisabled);
        }
        if !self.collectors.contains_key(&source) {
            return Err(SchedulerFault::UnknownSource(source.as_str().to_string()));
        }

        // --- FASE 1: CANDADO DE CINCO STRIKES ---
        let lockout_probe = self.auth_audit.probe_lockout(source).await?;
        if lockout_probe.is_locked(
            self.config.max_auth_attempts,
            self.config.block_duration(),
            Utc::now(),
        ) {
            warn!("⛔ [CHRONOS]: Source [{}] locked out by auth strikes.", source);
            return Err(SchedulerFault::RateLimited(format!(
                "{} consecutive authentication failures",
                lockout_probe.consecutive_failures
            )));
        }

        let window =
            requested_window.unwrap_or_else(|| DateRange::rolling_daily(self.config.zone_offset));

        // --- FASE 2: RESERVA EXCLUSIVA DEL SLOT ---
        let cancellation_flag: CancellationFlag = Arc::new(AtomicBool::new(false));
        {
            let mut schedules_guard = self
                .schedules
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let schedule_entry = schedules_guard
                .get_mut(&source)
                .ok_or_else(|| SchedulerFault::UnknownSource(source.as_str().to_string()))?;

            if schedule_entry.active_job.is_some() {
                return Err(SchedulerFault::AlreadyRunning);
            }

            // Reserva con identificador vacío: el alta del Ledger es asíncrona.
            schedule_entry.active_job = Some(ActiveJob {
                run_identifier: String::new(),
                cancellation_flag: cancellation_flag.clone(),
            });
        }

        // --- FASE 3: ALTA EN EL LEDGER DE CORRIDAS ---
        let run_identifier = match self.run_ledger.create_pending(source, window).await {
            Ok(identifier) => identifier,
            Err(ledger_fault) => {
                self.clear_active_slot(source, "");
                return Err(SchedulerFault::Ledger(ledger_fault));
            }
        };

        {
            let mut schedules_guard = self
                .schedules
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(active_job) = schedules_guard
                .get_mut(&source)
                .and_then(|entry| entry.active_job.as_mut())
            {
                active_job.run_identifier = run_identifier.clone();
            }
        }

        // --- FASE 4: DESPACHO AL WORKER POOL ---
        let scheduler_reference = Arc::clone(self);
        let dispatched_run_identifier = run_identifier.clone();
        tokio::spawn(async move {
            scheduler_reference
                .execute_run(source, dispatched_run_identifier, window, cancellation_flag)
                .await;
        });

        info!("🚀 [CHRONOS]: Run [{}] dispatched for [{}].", run_identifier, source);
        Ok(run_identifier)
    }

    /// Ejecución completa de una corrida bajo el techo global del semáforo.
    async fn execute_run(
        self: Arc<Self>,
        source: FeedSource,
        run_identifier: String,
        window: DateRange,
        cancellation_flag: CancellationFlag,
    ) {
        let _dispatch_permit = match self.dispatch_semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("💀 [CHRONOS]: Dispatch semaphore collapsed. Run abandoned.");
                self.clear_active_slot(source, &run_identifier);
                return;
            }
        };

        if let Err(transition_fault) = self.run_ledger.transition_running(&run_identifier).await {
            error!("💀 [CHRONOS]: Run [{}] transition rejected: {}", run_identifier, transition_fault);
            self.clear_active_slot(source, &run_identifier);
            return;
        }

        let credentials = self.resolve_credentials(source);
        let Some(collector) = self.collectors.get(&source).cloned() else {
            self.clear_active_slot(source, &run_identifier);
            return;
        };

        let collection_outcome = collector
            .collect(window, &credentials, &cancellation_flag)
            .await;

        match collection_outcome {
            Ok(harvest) => {
                // La credencial fue usada con éxito: auditoría + sonda positiva.
                self.record_auth_attempt(source, &credentials.username, true, None).await;

                let fetched_count = harvest.records.len() as u64;
                match self.conduit.ingest(source, window, harvest.records).await {
                    Ok(conduit_stats) => {
                        let page_losses = harvest.pages_failed > 0;
                        let row_losses =
                            harvest.rows_discarded > 0 || conduit_stats.skipped_invalid > 0;

                        let (final_status, error_kind, error_detail) = if page_losses {
                            (
                                RunStatus::Partial,
                                Some(RunErrorKind::SourceUnavailable),
                                Some(format!("{} pages lost after retries", harvest.pages_failed)),
                            )
                        } else if row_losses {
                            (
                                RunStatus::Partial,
                                Some(RunErrorKind::ParseError),
                                Some(format!(
                                    "{} rows discarded upstream, {} rejected by validation",
                                    harvest.rows_discarded, conduit_stats.skipped_invalid
                                )),
                            )
                        } else {
                            (RunStatus::Success, None, None)
                        };

                        self.seal_run(
                            &run_identifier,
                            final_status,
                            fetched_count,
                            conduit_stats,
                            error_kind,
                            error_detail,
                        )
                        .await;
                        self.note_success(source);
                    }
                    Err(ledger_fault) => {
                        // El lote fue revertido por el Ledger: corrida parcial con detalle.
                        self.seal_run(
                            &run_identifier,
                            RunStatus::Partial,
                            fetched_count,
                            UpsertStats::default(),
                            None,
                            Some(format!("batch reverted: {}", ledger_fault)),
                        )
                        .await;
                        self.note_failure(source);
                    }
                }
            }
            Err(CollectorError::Disabled) => {
                // Corrida no-op de fuente deshabilitada: jamás un fallo.
                self.seal_run(
                    &run_identifier,
                    RunStatus::Success,
                    0,
                    UpsertStats::default(),
                    Some(RunErrorKind::Disabled),
                    Some("source disabled by configuration".to_string()),
                )
                .await;
                self.note_success(source);
            }
            Err(CollectorError::Cancelled) => {
                // Cancelación cooperativa: el lote jamás se compromete.
                self.seal_run(
                    &run_identifier,
                    RunStatus::Cancelled,
                    0,
                    UpsertStats::default(),
                    None,
                    Some("cancelled by operator".to_string()),
                )
                .await;
            }
            Err(collector_fault) => {
                if matches!(collector_fault, CollectorError::AuthFailed(_)) {
                    self.record_auth_attempt(
                        source,
                        &credentials.username,
                        false,
                        Some(collector_fault.to_string()),
                    )
                    .await;
                    // La sonda negativa degrada credential.valid en el espejo.
                    if let Err(probe_fault) = self.credential_registry.probe(source, false).await {
                        warn!("⚠️ [CHRONOS]: Credential probe rejected: {}", probe_fault);
                    }
                }

                self.seal_run(
                    &run_identifier,
                    RunStatus::Failed,
                    0,
                    UpsertStats::default(),
                    collector_fault.run_error_kind(),
                    Some(collector_fault.to_string()),
                )
                .await;
                self.note_failure(source);
            }
        }

        self.clear_active_slot(source, &run_identifier);
    }

    /**
     * Cancelación cooperativa de la corrida en vuelo de una fuente.
     * Iza la bandera y arma la ventana de gracia; si el adaptador no
     * retorna a tiempo la corrida se abandona sellada como 'cancelled'.
     */
    #[instrument(skip(self))]
    pub fn cancel(self: &Arc<Self>, source: FeedSource) -> bool {
        let abandoned_run = {
            let schedules_guard = self
                .schedules
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match schedules_guard
                .get(&source)
                .and_then(|entry| entry.active_job.as_ref())
            {
                Some(active_job) => {
                    active_job.cancellation_flag.store(true, Ordering::Release);
                    active_job.run_identifier.clone()
                }
                None => return false,
            }
        };

        info!("🛑 [CHRONOS]: Cancellation flag raised for [{}].", source);

        let scheduler_reference = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(CANCELLATION_GRACE_SECONDS)).await;

            let still_active = {
                let schedules_guard = scheduler_reference
                    .schedules
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                schedules_guard
                    .get(&source)
                    .and_then(|entry| entry.active_job.as_ref())
                    .map(|job| job.run_identifier == abandoned_run)
                    .unwrap_or(false)
            };

            if still_active {
                warn!("💀 [CHRONOS]: Grace window elapsed. Run [{}] abandoned.", abandoned_run);
                scheduler_reference
                    .seal_run(
                        &abandoned_run,
                        RunStatus::Cancelled,
                        0,
                        UpsertStats::default(),
                        None,
                        Some("abandoned after cancellation grace window".to_string()),
                    )
                    .await;
                scheduler_reference.clear_active_slot(source, &abandoned_run);
            }
        });

        true
    }

    /// Habilita o deshabilita la agenda periódica; no cancela corridas en vuelo.
    pub async fn set_enabled(
        &self,
        source: FeedSource,
        enabled: bool,
    ) -> Result<(), SchedulerFault> {
        self.system_metadata.seal_schedule_flag(source, enabled).await?;

        let mut schedules_guard = self
            .schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(schedule_entry) = schedules_guard.get_mut(&source) {
            schedule_entry.enabled = enabled;
        }

        info!("🔄 [CHRONOS]: Periodic schedule for [{}] set to enabled={}.", source, enabled);
        Ok(())
    }

    /// Proyección del estado de agenda; jamás bloquea sobre corridas en vuelo.
    pub fn status_snapshot(&self) -> Vec<SourceScheduleView> {
        let schedules_guard = self
            .schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut snapshot: Vec<SourceScheduleView> = schedules_guard
            .iter()
            .map(|(source, entry)| SourceScheduleView {
                source: *source,
                enabled: entry.enabled,
                in_flight: entry.active_job.is_some(),
                consecutive_failures: entry.consecutive_failures,
                next_run_at: entry.enabled.then_some(entry.next_run_at),
            })
            .collect();
        snapshot.sort_by_key(|view| view.source);
        snapshot
    }

    /// Marcapasos periódico: evalúa las agendas cada minuto.
    pub async fn spawn_pacemaker(self: Arc<Self>) {
        let mut pacemaker_ticker = interval(Duration::from_secs(PACEMAKER_TICK_SECONDS));
        pacemaker_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::spawn(async move {
            info!("🕰️ [CHRONOS_PACEMAKER]: Periodic dispatch loop operational.");

            loop {
                pacemaker_ticker.tick().await;

                if self.config.force_disable_collection || !self.config.collection_enabled {
                    continue;
                }

                let due_sources: Vec<FeedSource> = {
                    let schedules_guard = self
                        .schedules
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    let now = Utc::now();
                    schedules_guard
                        .iter()
                        .filter(|(_, entry)| {
                            entry.enabled && entry.active_job.is_none() && entry.next_run_at <= now
                        })
                        .map(|(source, _)| *source)
                        .collect()
                };

                for due_source in due_sources {
                    match self.trigger(due_source, None).await {
                        Ok(run_identifier) => {
                            info!("🕰️ [CHRONOS_PACEMAKER]: Scheduled run [{}] for [{}].", run_identifier, due_source);
                        }
                        Err(SchedulerFault::AlreadyRunning) => {}
                        Err(dispatch_fault) => {
                            warn!("⚠️ [CHRONOS_PACEMAKER]: Dispatch for [{}] rejected: {}", due_source, dispatch_fault);
                        }
                    }
                }
            }
        });
    }

    // --- ESTRATO PRIVADO: TRANSICIONES Y MATERIAL ---

    /// Material de la corrida: Bóveda primero, respaldo de entorno después.
    fn resolve_credentials(&self, source: FeedSource) -> UpstreamCredentials {
        if let Ok(vault_entry) = self.vault.get(source) {
            return UpstreamCredentials {
                username: vault_entry.username,
                secret: vault_entry.secret,
                bearer_token: vault_entry.bearer_token,
            };
        }

        let fallback = match source {
            FeedSource::Regtech => &self.config.regtech_fallback,
            FeedSource::Secudium => &self.config.secudium_fallback,
            FeedSource::Manual => return UpstreamCredentials {
                username: String::new(),
                secret: String::new(),
                bearer_token: None,
            },
        };

        UpstreamCredentials {
            username: fallback.username.clone().unwrap_or_default(),
            secret: fallback.password.clone().unwrap_or_default(),
            bearer_token: fallback.bearer_token.clone(),
        }
    }

    async fn record_auth_attempt(
        &self,
        source: FeedSource,
        username: &str,
        success: bool,
        failure_reason: Option<String>,
    ) {
        let attempt = AuthAttempt {
            source,
            username: username.to_string(),
            when: Utc::now(),
            success,
            failure_reason,
            remote_ip: None,
        };

        if let Err(audit_fault) = self.auth_audit.record(&attempt).await {
            warn!("⚠️ [CHRONOS]: Auth audit rejected: {}", audit_fault);
        }
    }

    async fn seal_run(
        &self,
        run_identifier: &str,
        final_status: RunStatus,
        fetched_count: u64,
        stats: UpsertStats,
        error_kind: Option<RunErrorKind>,
        error_detail: Option<String>,
    ) {
        match self
            .run_ledger
            .seal(run_identifier, final_status, fetched_count, stats, error_kind, error_detail)
            .await
        {
            Ok(()) => {}
            // Una corrida abandonada por gracia ya fue sellada; el retorno
            // tardío del adaptador colisiona aquí y se absorbe.
            Err(DbError::RunAlreadySealed) => {}
            Err(seal_fault) => {
                error!("💀 [CHRONOS]: Run [{}] seal rejected: {}", run_identifier, seal_fault);
            }
        }
    }

    fn note_success(&self, source: FeedSource) {
        let mut schedules_guard = self
            .schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(schedule_entry) = schedules_guard.get_mut(&source) {
            schedule_entry.consecutive_failures = 0;
            schedule_entry.next_run_at = Utc::now() + schedule_entry.interval;
        }
    }

    fn note_failure(&self, source: FeedSource) {
        let mut schedules_guard = self
            .schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(schedule_entry) = schedules_guard.get_mut(&source) {
            schedule_entry.consecutive_failures += 1;

            let exponent = schedule_entry.consecutive_failures.min(16);
            let backoff_minutes =
                (BACKOFF_BASE_MINUTES.saturating_mul(1i64 << exponent)).min(BACKOFF_CAP_MINUTES);
            schedule_entry.next_run_at = Utc::now() + ChronoDuration::minutes(backoff_minutes);

            warn!(
                "⏳ [CHRONOS_BACKOFF]: [{}] failure #{} delays next run {} minutes.",
                source, schedule_entry.consecutive_failures, backoff_minutes
            );
        }
    }

    fn clear_active_slot(&self, source: FeedSource, run_identifier: &str) {
        let mut schedules_guard = self
            .schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(schedule_entry) = schedules_guard.get_mut(&source) {
            let slot_matches = schedule_entry
                .active_job
                .as_ref()
                .map(|job| job.run_identifier == run_identifier || job.run_identifier.is_empty())
                .unwrap_or(false);
            if slot_matches {
                schedule_entry.active_job = None;
            }
        }
    }
}
