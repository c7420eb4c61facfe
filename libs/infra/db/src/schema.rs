// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: LEDGER DATABASE SCHEMA (V12.2 - ACTIVE SET STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. ACTIVE SET: Tabla canónica 'ip_records' con llave única por
 *    dirección y llave de orden numérico para el listado plano.
 * 2. RUN LEDGER: Bitácora append-only de corridas de recolección.
 * 3. IDEMPOTENCIA: Gestión tolerante de migraciones en caliente.
 * 4. PERFORMANCE: Índices de aceleración para los endpoints de lectura.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del pipeline de inteligencia.
 */
const LEDGER_TABLES: &[(&str, &str)] = &[
    ("TABLE_IP_RECORDS", r#"
        CREATE TABLE IF NOT EXISTS ip_records (
            ip TEXT PRIMARY KEY,
            sort_key TEXT NOT NULL,
            source TEXT NOT NULL,
            sources_json TEXT NOT NULL DEFAULT '[]',
            detection_date TEXT NOT NULL,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            threat_level TEXT NOT NULL DEFAULT 'unknown',
            country TEXT,
            description TEXT,
            expires_at TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_COLLECTION_RUNS", r#"
        CREATE TABLE IF NOT EXISTS collection_runs (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            started_at TEXT,
            finished_at TEXT,
            fetched_count INTEGER NOT NULL DEFAULT 0,
            inserted_count INTEGER NOT NULL DEFAULT 0,
            updated_count INTEGER NOT NULL DEFAULT 0,
            error_kind TEXT,
            error_detail TEXT,
            window_start TEXT,
            window_end TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_CREDENTIALS", r#"
        CREATE TABLE IF NOT EXISTS credentials (
            source TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            rotated_at TEXT,
            valid INTEGER NOT NULL DEFAULT 1,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_AUTH_ATTEMPTS", r#"
        CREATE TABLE IF NOT EXISTS auth_attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            username TEXT NOT NULL,
            attempted_at TEXT NOT NULL,
            success INTEGER NOT NULL,
            failure_reason TEXT,
            remote_ip TEXT
        );
    "#),
    ("TABLE_SYSTEM_METADATA", r#"
        CREATE TABLE IF NOT EXISTS system_metadata (
            key TEXT PRIMARY KEY,
            value_text TEXT,
            value_int INTEGER,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a capacidades nuevas.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    // --- ATRIBUCIÓN Y GEOGRAFÍA ---
    ("RECORD_COUNTRY", "ALTER TABLE ip_records ADD COLUMN country TEXT"),
    ("RECORD_DESCRIPTION", "ALTER TABLE ip_records ADD COLUMN description TEXT"),
    // --- VENTANAS DE CORRIDA ---
    ("RUN_WINDOW_START", "ALTER TABLE collection_runs ADD COLUMN window_start TEXT"),
    ("RUN_WINDOW_END", "ALTER TABLE collection_runs ADD COLUMN window_end TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza los endpoints de lectura del Centro de Mando.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_RECORDS_SORT", "CREATE INDEX IF NOT EXISTS idx_records_sort_key ON ip_records(sort_key);"),
    ("IDX_RECORDS_ACTIVE", "CREATE INDEX IF NOT EXISTS idx_records_active ON ip_records(is_active, expires_at);"),
    ("IDX_RECORDS_SOURCE", "CREATE INDEX IF NOT EXISTS idx_records_source ON ip_records(source);"),
    ("IDX_RECORDS_DETECTION", "CREATE INDEX IF NOT EXISTS idx_records_detection ON ip_records(detection_date);"),
    ("IDX_RUNS_SOURCE", "CREATE INDEX IF NOT EXISTS idx_runs_source ON collection_runs(source, started_at);"),
    ("IDX_AUTH_SOURCE", "CREATE INDEX IF NOT EXISTS idx_auth_source ON auth_attempts(source, attempted_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_ledger_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V12.2...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Intelligence Ledger V12.2 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in LEDGER_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => debug!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
