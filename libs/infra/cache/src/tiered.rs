// [libs/infra/cache/src/tiered.rs]
/*!
 * =================================================================
 * APARATO: TIERED READ CACHE ENGINE (V6.3 - TRANSITION GUARD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CACHÉ DE LECTURA CON FALLBACK Y VERSIÓN ACTIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. VERSION KEYING: La llave compuesta incorpora la versión del
 *    conjunto activo; el bump post-commit convierte toda lectura
 *    obsoleta en miss estructural sin tocar el primario.
 * 2. TRANSITION GUARD: El corte del primario se traza una sola vez
 *    por transición de estado; sin tormentas de log.
 * 3. BOUNDED FALLBACK: El nivel en proceso es un LRU acotado por
 *    techo de entradas con TTL honrado por instante de expiración.
 *
 * # Mathematical Proof (Coherence by Keying):
 * Sea V la versión sellada por el último commit. Toda llave emitida
 * bajo V' < V es inalcanzable para los lectores (componen la llave
 * con V), por lo que el contenido obsoleto expira por TTL sin poder
 * ser servido jamás: coherencia sin invalidación explícita.
 * =================================================================
 */

use lru::LruCache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Techo por defecto del nivel de respaldo en proceso.
pub const DEFAULT_FALLBACK_ENTRY_CEILING: usize = 10_000;

/// Estado observable del estrato para el endpoint de salud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTierState {
    /// Primario configurado y respondiendo.
    Healthy,
    /// Primario configurado pero inalcanzable; sirviendo desde respaldo.
    Degraded,
    /// Sin primario configurado; operación exclusiva en proceso.
    MemoryOnly,
}

impl CacheTierState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTierState::Healthy => "healthy",
            CacheTierState::Degraded => "degraded",
            CacheTierState::MemoryOnly => "memory_only",
        }
    }
}

/// Entrada del nivel de respaldo con expiración por instante.
struct FallbackSlot {
    body: String,
    expires_at: Instant,
}

/// Caché de lectura de dos niveles del estrato de consulta.
pub struct TieredCache {
    primary_uplink: Option<ConnectionManager>,
    /// URL primaria declarada: distingue 'degradado' de 'solo memoria'.
    primary_configured: bool,
    fallback_tier: Mutex<LruCache<String, FallbackSlot>>,
    active_set_version: AtomicU64,
    primary_degraded: AtomicBool,
}

impl TieredCache {
    /**
     * Forja el estrato de caché. Con URL vacía o ausente opera en modo
     * exclusivo de proceso; un primario inalcanzable en el arranque
     * degrada a respaldo con un único evento de transición.
     */
    pub async fn connect(
        primary_cache_url: Option<&str>,
        fallback_entry_ceiling: usize,
        initial_version: u64,
    ) -> Self {
        let declared_primary = primary_cache_url.filter(|url| !url.is_empty());
        let primary_configured = declared_primary.is_some();

        let primary_uplink = match declared_primary {
            Some(cache_url) => match redis::Client::open(cache_url) {
                Ok(redis_client) => match ConnectionManager::new(redis_client).await {
                    Ok(managed_connection) => {
                        info!("🗄️  [CACHE]: Primary tier uplink established.");
                        Some(managed_connection)
                    }
                    Err(uplink_fault) => {
                        warn!(
                            "⚠️ [CACHE_DEGRADED]: Primary unreachable at ignition ({}). Fallback tier active.",
                            uplink_fault
                        );
                        None
                    }
                },
                Err(url_fault) => {
                    warn!("⚠️ [CACHE_DEGRADED]: Primary URL rejected ({}). Fallback tier active.", url_fault);
                    None
                }
            },
            None => {
                info!("🗄️  [CACHE]: No primary configured. Memory-only tier active.");
                None
            }
        };

        let bounded_ceiling = NonZeroUsize::new(fallback_entry_ceiling.max(1))
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_FALLBACK_ENTRY_CEILING).unwrap());

        let boot_degraded = primary_configured && primary_uplink.is_none();

        Self {
            primary_uplink,
            primary_configured,
            fallback_tier: Mutex::new(LruCache::new(bounded_ceiling)),
            active_set_version: AtomicU64::new(initial_version),
            primary_degraded: AtomicBool::new(boot_degraded),
        }
    }

    /// Versión del conjunto activo bajo la que se componen las llaves.
    pub fn current_version(&self) -> u64 {
        self.active_set_version.load(Ordering::Acquire)
    }

    /// Bump post-commit: adopta la versión sellada por la ingesta.
    /// Monótono; un bump rezagado jamás retrocede el contador.
    pub fn bump_version(&self, sealed_version: u64) {
        self.active_set_version
            .fetch_max(sealed_version, Ordering::AcqRel);
        info!("🗄️  [CACHE_VERSION]: Active set version leveled at {}.", self.current_version());
    }

    /// Lectura: primario primero, respaldo transparente ante miss o corte.
    pub async fn fetch(&self, endpoint: &str, params: &str) -> Option<String> {
        let composed_key = self.compose_key(endpoint, params);

        if let Some(primary) = &self.primary_uplink {
            let mut uplink = primary.clone();
            match uplink.get::<_, Option<String>>(&composed_key).await {
                Ok(Some(cached_body)) => {
                    self.mark_primary_recovered();
                    return Some(cached_body);
                }
                Ok(None) => {
                    self.mark_primary_recovered();
                    // Miss limpio del primario: cae al respaldo.
                }
                Err(uplink_fault) => {
                    self.mark_primary_degraded(&uplink_fault.to_string());
                }
            }
        }

        let mut fallback_guard = self.fallback_tier.lock().ok()?;
        match fallback_guard.get(&composed_key) {
            Some(slot) if slot.expires_at > Instant::now() => Some(slot.body.clone()),
            Some(_) => {
                fallback_guard.pop(&composed_key);
                None
            }
            None => None,
        }
    }

    /// Escritura con TTL explícito en segundos; puebla ambos niveles.
    pub async fn store(&self, endpoint: &str, params: &str, body: String, ttl_seconds: u64) {
        let composed_key = self.compose_key(endpoint, params);

        if let Some(primary) = &self.primary_uplink {
            let mut uplink = primary.clone();
            match uplink
                .set_ex::<_, _, ()>(&composed_key, body.clone(), ttl_seconds)
                .await
            {
                Ok(()) => self.mark_primary_recovered(),
                Err(uplink_fault) => self.mark_primary_degraded(&uplink_fault.to_string()),
            }
        }

        if let Ok(mut fallback_guard) = self.fallback_tier.lock() {
            fallback_guard.put(
                composed_key,
                FallbackSlot {
                    body,
                    expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
                },
            );
        }
    }

    /// Estado observable para el componente 'cache' del health check.
    pub fn tier_state(&self) -> CacheTierState {
        if !self.primary_configured {
            return CacheTierState::MemoryOnly;
        }
        if self.primary_degraded.load(Ordering::Acquire) {
            CacheTierState::Degraded
        } else {
            CacheTierState::Healthy
        }
    }

    // --- ESTRATO PRIVADO: TRANSICIONES Y LLAVES ---

    fn compose_key(&self, endpoint: &str, params: &str) -> String {
        format!("blacklist:v{}:{}:{}", self.current_version(), endpoint, params)
    }

    fn mark_primary_degraded(&self, fault_detail: &str) {
        // swap garantiza un único evento de log por transición sana → degradada.
        if !self.primary_degraded.swap(true, Ordering::AcqRel) {
            warn!(
                "⚠️ [CACHE_DEGRADED]: Primary tier unreachable ({}). Serving from in-process fallback.",
                fault_detail
            );
        }
    }

    fn mark_primary_recovered(&self) {
        if self.primary_degraded.swap(false, Ordering::AcqRel) {
            info!("✅ [CACHE_RECOVERED]: Primary tier reachable again. Dual-tier service restored.");
        }
    }
}
