// [libs/shared/heimdall/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HEIMDALL NEURAL OBSERVER (V28.0 - FEED PIPELINE)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: IGNICIÓN DEL TRAZADO Y VIGILANCIA DE COLAPSOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NOISE SHIELD: Sin RUST_LOG explícito, el filtro eleva el dominio
 *    de recolección y silencia el transporte (tower, hyper, libsql,
 *    redis) para que el rastro REGTECH/SECUDIUM domine la salida.
 * 2. COLLAPSE WATCH: Un hook global captura el pánico de cualquier
 *    daemon (Chronos, Reaper, Conduit) y lo cristaliza como evento
 *    estructurado antes de la defunción del hilo.
 * 3. DUAL SURFACE: Compacto con hilos nombrados para el Arquitecto en
 *    desarrollo; JSON plano para los agregadores en producción.
 * =================================================================
 */

use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates del dominio que el escudo eleva al nivel solicitado.
const DOMAIN_TARGETS: &[&str] = &[
    "blacklist_infra_db",
    "blacklist_infra_collectors",
    "blacklist_infra_cache",
];

/// Infraestructura de transporte silenciada por el escudo.
const TRANSPORT_MUTES: &[&str] = &["tower_http=warn", "hyper=warn", "libsql=error", "redis=warn"];

/// Inicializa el trazado Heimdall y arma la vigilancia de colapsos.
///
/// # Comportamiento:
/// - Desarrollo: salida compacta con color e hilos nombrados.
/// - Producción: eventos JSON aplanados para la ingesta estructurada.
///
/// # Errors:
/// Retorna pánico si otro suscriptor global ya fue inicializado.
pub fn init_tracing(service_nominal_identifier: &str) {
    let release_mode = !cfg!(debug_assertions);
    let noise_shield = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| forge_noise_shield(service_nominal_identifier, release_mode));

    if release_mode {
        tracing_subscriber::registry()
            .with(noise_shield)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(noise_shield)
            .with(fmt::layer().compact().with_target(false).with_thread_names(true))
            .init();
    }

    arm_collapse_watch(service_nominal_identifier);

    info!(
        "👁️  [HEIMDALL_ONLINE]: Observability strata levelized for [{}]. Collapse watch ARMED.",
        service_nominal_identifier
    );
}

/// Compone la directiva de filtro por defecto: el servicio y los crates
/// del dominio al nivel base, el transporte amordazado.
fn forge_noise_shield(service_nominal_identifier: &str, release_mode: bool) -> EnvFilter {
    let base_level = if release_mode { "info" } else { "debug" };

    let mut directive = format!("{}={}", service_nominal_identifier, base_level);
    for domain_target in DOMAIN_TARGETS {
        directive.push_str(&format!(",{}={}", domain_target, base_level));
    }
    for transport_mute in TRANSPORT_MUTES {
        directive.push(',');
        directive.push_str(transport_mute);
    }

    EnvFilter::new(directive)
}

/// Arma el hook global de pánico. Todo colapso de hilo queda trazado
/// con su origen en el árbol de fuentes y el detalle del payload.
fn arm_collapse_watch(service_nominal_identifier: &str) {
    let watched_service = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |collapse_report| {
        let collapse_origin = match collapse_report.location() {
            Some(location) => format!("{}:{}", location.file(), location.line()),
            None => "origin withheld by runtime".to_string(),
        };

        // El payload de un pánico llega como String o como &str literal.
        let collapse_detail = collapse_report
            .payload()
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| {
                collapse_report
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|literal| literal.to_string())
            })
            .unwrap_or_else(|| "opaque panic payload".to_string());

        error!(
            target: "collapse_watch",
            service = %watched_service,
            origin = %collapse_origin,
            "☠️ [THREAD_COLLAPSE]: Daemon terminated abruptly. Detail: {}",
            collapse_detail
        );
    }));
}
