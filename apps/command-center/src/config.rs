// [apps/command-center/src/config.rs]
/*!
 * =================================================================
 * APARATO: ENVIRONMENT CAPTURE ENGINE (V7.2 - EXIT CODE CONTRACT)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CAPTURA TIPADA Y VALIDADA DEL ENTORNO SOBERANO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FAIL FAST: Toda violación de entorno colapsa el arranque con
 *    código de salida 1 antes de abrir socket alguno.
 * 2. VAULT FALLBACK: Las credenciales REGTECH_* / SECUDIUM_* del
 *    entorno actúan como respaldo cuando la Bóveda no porta material.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use blacklist_domain_models::clock;
use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Puerto de escucha por defecto dentro del contenedor.
const DEFAULT_LISTEN_PORT: u16 = 2542;
/// Retención por defecto del conjunto activo (días).
const DEFAULT_RETENTION_DAYS: i64 = 90;
/// Techo global de corridas en vuelo.
const DEFAULT_GLOBAL_RUN_CAP: usize = 2;
/// Cadencia periódica por defecto de REGTECH (horas).
const DEFAULT_REGTECH_INTERVAL_HOURS: i64 = 6;
/// Política de candado de autenticación.
const DEFAULT_MAX_AUTH_ATTEMPTS: u32 = 5;
const DEFAULT_BLOCK_DURATION_HOURS: i64 = 1;

#[derive(Error, Debug)]
pub enum ConfigFault {
    #[error("[L3_CONFIG_FAULT]: VARIABLE_MALFORMED [{variable}] -> {detail}")]
    Malformed { variable: &'static str, detail: String },

    #[error("[L3_CONFIG_FAULT]: TIMEZONE_UNSUPPORTED [{0}]")]
    TimezoneUnsupported(String),
}

/// Credenciales de respaldo tomadas del entorno para una fuente.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialFallback {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
}

/// Captura tipada y validada del entorno del Centro de Mando.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    // --- RED Y PERSISTENCIA ---
    pub listen_port: u16,
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub cache_url: Option<String>,

    // --- SEMÁNTICA TEMPORAL ---
    pub zone_offset: FixedOffset,
    pub retention_days: i64,

    // --- GOBERNANZA DE RECOLECCIÓN ---
    pub collection_enabled: bool,
    pub force_disable_collection: bool,
    pub global_run_cap: usize,
    pub regtech_interval_hours: i64,

    // --- UPSTREAMS ---
    pub regtech_base_url: String,
    pub regtech_fallback: EnvCredentialFallback,
    pub secudium_base_url: String,
    pub secudium_fallback: EnvCredentialFallback,
    pub secudium_enabled: bool,

    // --- SEGURIDAD DEL PLANO DE CONTROL ---
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub read_endpoints_require_key: bool,

    // --- CANDADO DE AUTENTICACIÓN ---
    pub max_auth_attempts: u32,
    pub block_duration_hours: i64,

    // --- BÓVEDA ---
    pub vault_file_path: PathBuf,
    pub vault_seed_path: PathBuf,
}

impl SystemConfig {
    /**
     * Captura el entorno completo. Un fallo aquí es 'config_error':
     * el binario termina con código de salida 1.
     */
    pub fn capture() -> Result<Self, ConfigFault> {
        let listen_port = parse_env("PORT", DEFAULT_LISTEN_PORT)?;
        let retention_days = parse_env("RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?;
        let max_auth_attempts = parse_env("MAX_AUTH_ATTEMPTS", DEFAULT_MAX_AUTH_ATTEMPTS)?;
        let block_duration_hours = parse_env("BLOCK_DURATION_HOURS", DEFAULT_BLOCK_DURATION_HOURS)?;

        let timezone_identifier =
            env::var("TIMEZONE").unwrap_or_else(|_| "Asia/Seoul".to_string());
        let zone_offset = clock::offset_for_zone(&timezone_identifier)
            .ok_or_else(|| ConfigFault::TimezoneUnsupported(timezone_identifier.clone()))?;

        Ok(Self {
            listen_port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "file:data/blacklist.db".to_string()),
            database_auth_token: env::var("TURSO_AUTH_TOKEN").ok(),
            cache_url: env::var("CACHE_URL").ok().filter(|url| !url.is_empty()),

            zone_offset,
            retention_days,

            collection_enabled: parse_bool_env("COLLECTION_ENABLED", true),
            force_disable_collection: parse_bool_env("FORCE_DISABLE_COLLECTION", false),
            global_run_cap: DEFAULT_GLOBAL_RUN_CAP,
            regtech_interval_hours: DEFAULT_REGTECH_INTERVAL_HOURS,

            regtech_base_url: env::var("REGTECH_BASE_URL")
                .unwrap_or_else(|_| "https://regtech.fsec.or.kr".to_string()),
            regtech_fallback: EnvCredentialFallback {
                username: env::var("REGTECH_USERNAME").ok(),
                password: env::var("REGTECH_PASSWORD").ok(),
                bearer_token: env::var("REGTECH_BEARER_TOKEN").ok(),
            },
            secudium_base_url: env::var("SECUDIUM_BASE_URL")
                .unwrap_or_else(|_| "https://isap.secudium.co.kr".to_string()),
            secudium_fallback: EnvCredentialFallback {
                username: env::var("SECUDIUM_USERNAME").ok(),
                password: env::var("SECUDIUM_PASSWORD").ok(),
                bearer_token: None,
            },
            // SECUDIUM nace apagado: habilitación explícita por entorno u operador.
            secudium_enabled: parse_bool_env("SECUDIUM_ENABLED", false),

            api_key: env::var("DEFAULT_API_KEY").ok().filter(|key| !key.is_empty()),
            jwt_secret: env::var("JWT_SECRET_KEY")
                .or_else(|_| env::var("SECRET_KEY"))
                .ok()
                .filter(|secret| !secret.is_empty()),
            read_endpoints_require_key: parse_bool_env("READ_API_KEY_REQUIRED", false),

            max_auth_attempts,
            block_duration_hours,

            vault_file_path: PathBuf::from(
                env::var("CREDENTIAL_VAULT_PATH")
                    .unwrap_or_else(|_| "data/credential.vault".to_string()),
            ),
            vault_seed_path: PathBuf::from(
                env::var("CREDENTIAL_VAULT_SEED_PATH")
                    .unwrap_or_else(|_| "data/vault.seed".to_string()),
            ),
        })
    }

    /// Ventana de bloqueo del candado de autenticación.
    pub fn block_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.block_duration_hours)
    }
}

fn parse_env<T>(variable: &'static str, default_value: T) -> Result<T, ConfigFault>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(variable) {
        Ok(raw_value) if !raw_value.trim().is_empty() => {
            raw_value.trim().parse().map_err(|fault: T::Err| ConfigFault::Malformed {
                variable,
                detail: fault.to_string(),
            })
        }
        _ => Ok(default_value),
    }
}

fn parse_bool_env(variable: &'static str, default_value: bool) -> bool {
    match env::var(variable) {
        Ok(raw_value) => matches!(
            raw_value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default_value,
    }
}
