// [tests/mirror/libs/shared/heimdall/heimdall_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE INTEGRIDAD HEIMDALL (V2.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L6-MIRROR
 * RESPONSABILIDAD: IGNICIÓN DEL SUSCRIPTOR Y SUPERVIVENCIA DEL RASTRO
 * =================================================================
 */

use blacklist_shared_heimdall::init_tracing;
use tracing::{info, warn};

/**
 * CERTIFICACIÓN: La ignición del observador no colapsa y el rastro
 * posterior fluye sin pánico. La unicidad del suscriptor global exige
 * un único test de ignición por proceso.
 */
#[test]
fn certify_tracing_ignition_and_emission() {
    println!("\n👁️  [PROVING_GROUNDS]: Igniting Heimdall observer...");

    init_tracing("blacklist_proving_grounds");

    info!("🧪 [TRACE_PROBE]: Structured emission survives ignition.");
    warn!(component = "mirror", "🧪 [TRACE_PROBE]: Field-bearing emission survives.");
}
