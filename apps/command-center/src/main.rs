// [apps/command-center/src/main.rs]
/*!
 * =================================================================
 * APARATO: COMMAND CENTER MAIN ENTRY POINT (V9.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EXIT CONTRACT: 0 apagado limpio, 1 error de configuración,
 *    2 bóveda corrupta, 3 Ledger inalcanzable en el arranque.
 * 2. DETERMINISTIC IGNITION: La Bóveda y el Ledger certifican su
 *    integridad antes de la apertura del socket TCP.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use blacklist_command_center::prelude::*;

use blacklist_shared_heimdall::init_tracing;
use dotenvy::dotenv;
use tracing::{error, info};

/**
 * Punto de ignición supremo del binario del Centro de Mando.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    // Hidrata las variables de .env en el espacio de nombres del proceso.
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (HEIMDALL)
    init_tracing("blacklist_command_center");

    // 3. CAPTURA Y VALIDACIÓN DEL ENTORNO (EXIT CODE 1)
    let system_config = match SystemConfig::capture() {
        Ok(captured) => captured,
        Err(config_fault) => {
            error!("❌ [CONFIG_FAULT]: Environment capture rejected: {}", config_fault);
            std::process::exit(1);
        }
    };

    // 4. CONFIGURACIÓN DEL RUNTIME SOBERANO
    let runtime_command_center = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_command_center.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        // 5. CONSTRUCCIÓN DEL KERNEL SOBERANO (EXIT CODES 2/3)
        let kernel_instance = match CommandCenterKernel::ignite(system_config).await {
            Ok(ignited_kernel) => ignited_kernel,
            Err(ignition_fault) => {
                error!("❌ [IGNITION_FAULT]: {}", ignition_fault);
                std::process::exit(ignition_fault.exit_code());
            }
        };

        // 6. IGNICIÓN DE OPERACIONES
        // Activa el marcapasos del Chronos, el Reaper y el servidor Axum.
        info!(
            "🚀 [PIPELINE_ONLINE]: System fully operational on port {}.",
            kernel_instance.server_network_port
        );
        kernel_instance.launch_operations().await;
    });

    Ok(())
}
