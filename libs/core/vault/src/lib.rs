// [libs/core/vault/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL VAULT ENGINE (V4.3 - KEY ROTATION SEALED)
 * CLASIFICACIÓN: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: CUSTODIA CIFRADA DE CREDENCIALES UPSTREAM
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENVELOPE SCHEME: El material viaja bajo una llave de datos (DEK)
 *    AES-256-GCM; la DEK se persiste envuelta por una KEK derivada
 *    (PBKDF2-HMAC-SHA256, 150k iteraciones) de la semilla local de
 *    máquina creada en el primer arranque.
 * 2. FAIL-CLOSED: Un archivo corrupto colapsa la apertura completa de
 *    la bóveda; el proceso debe rehusar el arranque antes que
 *    re-inicializar silenciosamente.
 * 3. ATOMIC CRYSTALLIZATION: Toda escritura pasa por tempfile en el
 *    mismo directorio + rename atómico, con modo 0600 re-aplicado.
 *
 * # Mathematical Proof (Rotation Safety):
 * La rotación genera una DEK nueva, re-cifra el mapa completo y solo
 * entonces sella el archivo con key_version+1. El rename atómico
 * garantiza que un observador vea siempre un archivo íntegro bajo
 * exactamente una versión de llave.
 * =================================================================
 */

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use blacklist_domain_models::source::FeedSource;
use chrono::{DateTime, Utc};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{info, warn};

/// Iteraciones de derivación de la KEK (sincronizado con el estándar interno).
const PBKDF2_ITERATIONS: u32 = 150_000;
const KEY_LENGTH_BYTES: usize = 32;
const NONCE_LENGTH_BYTES: usize = 12;
const SALT_LENGTH_BYTES: usize = 16;
/// DEK de 32 bytes + etiqueta GCM de 16 bytes.
const WRAPPED_DEK_LENGTH_BYTES: usize = KEY_LENGTH_BYTES + 16;
/// Firma del contenedor en disco.
const VAULT_MAGIC: &[u8; 4] = b"BLKV";
const VAULT_FORMAT_VERSION: u8 = 1;

#[derive(Error, Debug)]
pub enum VaultError {
    /// El contenedor es ilegible o la integridad criptográfica colapsó.
    /// Es fatal: el proceso debe rehusar el arranque (exit code 2).
    #[error("[L1_VAULT_FAULT]: CONTAINER_INTEGRITY_COLLAPSED -> {0}")]
    Corrupt(String),

    /// La fuente solicitada no tiene entrada en la bóveda.
    #[error("[L1_VAULT_FAULT]: CREDENTIAL_NOT_FOUND -> {0}")]
    NotFound(String),

    /// Fallo de E/S al cristalizar o leer el contenedor.
    #[error("[L1_VAULT_FAULT]: DISK_ACCESS_DENIED -> {0}")]
    Io(#[from] std::io::Error),

    /// Fallo del motor GCM durante el sellado de material nuevo.
    #[error("[L1_VAULT_FAULT]: SEALING_MALFUNCTION")]
    SealingFailure,
}

/// Entrada de la bóveda: el único lugar donde el secreto vive en claro
/// es la memoria del proceso durante una corrida.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultEntry {
    pub username: String,
    pub secret: String,
    /// Token bearer de larga vida inyectado fuera de banda por el operador.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    pub rotated_at: DateTime<Utc>,
}

/// Estado interno descifrado de la bóveda.
struct VaultState {
    key_version: u32,
    kek_salt: [u8; SALT_LENGTH_BYTES],
    data_key: [u8; KEY_LENGTH_BYTES],
    entries: HashMap<String, VaultEntry>,
}

/// Bóveda de credenciales con contenedor único en disco.
pub struct CredentialVault {
    vault_file_path: PathBuf,
    seed_file_path: PathBuf,
    state: RwLock<VaultState>,
}

impl CredentialVault {
    /**
     * Abre (o inicializa en el primer arranque) la bóveda.
     *
     * # Errors:
     * - `VaultError::Corrupt`: contenedor truncado, firma desconocida o
     *   fallo de descifrado. El llamador debe abortar el arranque.
     */
    pub fn open(vault_file_path: &Path, seed_file_path: &Path) -> Result<Self, VaultError> {
        let machine_seed = Self::load_or_create_machine_seed(seed_file_path)?;

        let state = if vault_file_path.exists() {
            Self::decode_container(&fs::read(vault_file_path)?, &machine_seed)?
        } else {
            // Primer arranque: bóveda vacía con DEK fresca.
            info!("🔐 [VAULT]: No container found. Forging empty vault at first start.");
            let mut kek_salt = [0u8; SALT_LENGTH_BYTES];
            rand::thread_rng().fill_bytes(&mut kek_salt);
            let mut data_key = [0u8; KEY_LENGTH_BYTES];
            rand::thread_rng().fill_bytes(&mut data_key);

            VaultState {
                key_version: 1,
                kek_salt,
                data_key,
                entries: HashMap::new(),
            }
        };

        let vault_instance = Self {
            vault_file_path: vault_file_path.to_path_buf(),
            seed_file_path: seed_file_path.to_path_buf(),
            state: RwLock::new(state),
        };

        // Cristalización inicial para que el contenedor y su modo 0600 existan.
        {
            let state_guard = vault_instance
                .state
                .read()
                .map_err(|_| VaultError::Corrupt("STATE_LOCK_POISONED".into()))?;
            vault_instance.persist_locked(&state_guard, &machine_seed)?;
        }

        info!(
            "🔐 [VAULT_ONLINE]: Container open. key_version={}, entries={}.",
            vault_instance.key_version(),
            vault_instance
                .state
                .read()
                .map(|s| s.entries.len())
                .unwrap_or(0)
        );

        Ok(vault_instance)
    }

    /// Entrega el material en claro de una fuente. Descifrado ya realizado en open.
    pub fn get(&self, source: FeedSource) -> Result<VaultEntry, VaultError> {
        let state_guard = self
            .state
            .read()
            .map_err(|_| VaultError::Corrupt("STATE_LOCK_POISONED".into()))?;

        state_guard
            .entries
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| VaultError::NotFound(source.as_str().to_string()))
    }

    /**
     * Reemplaza la entrada de una fuente y cristaliza el contenedor.
     * Actualiza 'rotated_at' al instante del reemplazo.
     */
    pub fn put(
        &self,
        source: FeedSource,
        username: String,
        secret: String,
        bearer_token: Option<String>,
    ) -> Result<(), VaultError> {
        let machine_seed = Self::load_or_create_machine_seed(&self.seed_file_path)?;

        let mut state_guard = self
            .state
            .write()
            .map_err(|_| VaultError::Corrupt("STATE_LOCK_POISONED".into()))?;

        state_guard.entries.insert(
            source.as_str().to_string(),
            VaultEntry {
                username,
                secret,
                bearer_token,
                rotated_at: Utc::now(),
            },
        );

        self.persist_locked(&state_guard, &machine_seed)?;
        info!("🔐 [VAULT]: Credential material replaced for source [{}].", source);
        Ok(())
    }

    /**
     * Rotación de llave: DEK nueva, re-cifrado completo, key_version+1.
     * La llave antigua se descarta tras el sellado exitoso.
     */
    pub fn rotate(&self) -> Result<u32, VaultError> {
        let machine_seed = Self::load_or_create_machine_seed(&self.seed_file_path)?;

        let mut state_guard = self
            .state
            .write()
            .map_err(|_| VaultError::Corrupt("STATE_LOCK_POISONED".into()))?;

        let mut fresh_data_key = [0u8; KEY_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut fresh_data_key);
        state_guard.data_key = fresh_data_key;
        state_guard.key_version += 1;

        self.persist_locked(&state_guard, &machine_seed)?;

        info!("♻️  [VAULT_ROTATION]: Data key rotated. key_version={}.", state_guard.key_version);
        Ok(state_guard.key_version)
    }

    /// Contador de versión de la llave de datos vigente.
    pub fn key_version(&self) -> u32 {
        self.state.read().map(|s| s.key_version).unwrap_or(0)
    }

    /// Fuentes con material custodiado (sin exponer secretos).
    pub fn guarded_sources(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| {
                let mut sources: Vec<String> = s.entries.keys().cloned().collect();
                sources.sort();
                sources
            })
            .unwrap_or_default()
    }

    // --- ESTRATO PRIVADO: CRIPTOGRAFÍA Y CRISTALIZACIÓN ---

    fn load_or_create_machine_seed(seed_file_path: &Path) -> Result<[u8; KEY_LENGTH_BYTES], VaultError> {
        if seed_file_path.exists() {
            let seed_bytes = fs::read(seed_file_path)?;
            let seed: [u8; KEY_LENGTH_BYTES] = seed_bytes
                .try_into()
                .map_err(|_| VaultError::Corrupt("MACHINE_SEED_MALFORMED".into()))?;
            return Ok(seed);
        }

        // Primer arranque de la máquina: forja de semilla local.
        let mut fresh_seed = [0u8; KEY_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut fresh_seed);

        if let Some(parent_directory) = seed_file_path.parent() {
            fs::create_dir_all(parent_directory)?;
        }
        Self::write_atomic_owner_only(seed_file_path, &fresh_seed)?;
        warn!("🔐 [VAULT]: Machine seed forged at [{}].", seed_file_path.display());
        Ok(fresh_seed)
    }

    fn derive_kek(machine_seed: &[u8], kek_salt: &[u8]) -> [u8; KEY_LENGTH_BYTES] {
        let mut derived_key = [0u8; KEY_LENGTH_BYTES];
        pbkdf2_hmac::<Sha256>(machine_seed, kek_salt, PBKDF2_ITERATIONS, &mut derived_key);
        derived_key
    }

    /// Decodifica y descifra el contenedor completo. Cualquier anomalía es Corrupt.
    fn decode_container(
        container_bytes: &[u8],
        machine_seed: &[u8],
    ) -> Result<VaultState, VaultError> {
        let fixed_header_length =
            4 + 1 + 4 + SALT_LENGTH_BYTES + NONCE_LENGTH_BYTES + WRAPPED_DEK_LENGTH_BYTES + NONCE_LENGTH_BYTES;
        if container_bytes.len() < fixed_header_length {
            return Err(VaultError::Corrupt("CONTAINER_TRUNCATED".into()));
        }

        let mut cursor = 0usize;

        if &container_bytes[cursor..cursor + 4] != VAULT_MAGIC {
            return Err(VaultError::Corrupt("MAGIC_MISMATCH".into()));
        }
        cursor += 4;

        if container_bytes[cursor] != VAULT_FORMAT_VERSION {
            return Err(VaultError::Corrupt(format!(
                "UNSUPPORTED_FORMAT_VERSION_{}",
                container_bytes[cursor]
            )));
        }
        cursor += 1;

        let key_version = u32::from_be_bytes(
            container_bytes[cursor..cursor + 4]
                .try_into()
                .map_err(|_| VaultError::Corrupt("KEY_VERSION_MALFORMED".into()))?,
        );
        cursor += 4;

        let mut kek_salt = [0u8; SALT_LENGTH_BYTES];
        kek_salt.copy_from_slice(&container_bytes[cursor..cursor + SALT_LENGTH_BYTES]);
        cursor += SALT_LENGTH_BYTES;

        let wrapped_dek_nonce = &container_bytes[cursor..cursor + NONCE_LENGTH_BYTES];
        cursor += NONCE_LENGTH_BYTES;

        let wrapped_dek = &container_bytes[cursor..cursor + WRAPPED_DEK_LENGTH_BYTES];
        cursor += WRAPPED_DEK_LENGTH_BYTES;

        let payload_nonce = &container_bytes[cursor..cursor + NONCE_LENGTH_BYTES];
        cursor += NONCE_LENGTH_BYTES;

        let payload_ciphertext = &container_bytes[cursor..];

        // 1. DESENVOLTURA DE LA DEK BAJO LA KEK DERIVADA
        let kek = Self::derive_kek(machine_seed, &kek_salt);
        let kek_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&kek));
        let data_key_bytes = kek_cipher
            .decrypt(Nonce::from_slice(wrapped_dek_nonce), wrapped_dek)
            .map_err(|_| VaultError::Corrupt("DEK_UNWRAP_REJECTED".into()))?;

        let data_key: [u8; KEY_LENGTH_BYTES] = data_key_bytes
            .try_into()
            .map_err(|_| VaultError::Corrupt("DEK_LENGTH_VIOLATION".into()))?;

        // 2. APERTURA DEL PAYLOAD BAJO LA DEK
        let payload_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&data_key));
        let payload_plaintext = payload_cipher
            .decrypt(Nonce::from_slice(payload_nonce), payload_ciphertext)
            .map_err(|_| VaultError::Corrupt("PAYLOAD_INTEGRITY_REJECTED".into()))?;

        let entries: HashMap<String, VaultEntry> = serde_json::from_slice(&payload_plaintext)
            .map_err(|fault| VaultError::Corrupt(format!("ENTRY_MAP_MALFORMED: {}", fault)))?;

        Ok(VaultState {
            key_version,
            kek_salt,
            data_key,
            entries,
        })
    }

    /// Cifra el estado y lo cristaliza con rename atómico + modo 0600.
    fn persist_locked(&self, state: &VaultState, machine_seed: &[u8]) -> Result<(), VaultError> {
        let payload_plaintext =
            serde_json::to_vec(&state.entries).map_err(|_| VaultError::SealingFailure)?;

        let mut wrapped_dek_nonce = [0u8; NONCE_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut wrapped_dek_nonce);
        let mut payload_nonce = [0u8; NONCE_LENGTH_BYTES];
        rand::thread_rng().fill_bytes(&mut payload_nonce);

        let kek = Self::derive_kek(machine_seed, &state.kek_salt);
        let kek_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&kek));
        let wrapped_dek = kek_cipher
            .encrypt(Nonce::from_slice(&wrapped_dek_nonce), state.data_key.as_slice())
            .map_err(|_| VaultError::SealingFailure)?;

        let payload_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&state.data_key));
        let payload_ciphertext = payload_cipher
            .encrypt(Nonce::from_slice(&payload_nonce), payload_plaintext.as_slice())
            .map_err(|_| VaultError::SealingFailure)?;

        let mut container_bytes =
            Vec::with_capacity(64 + payload_ciphertext.len());
        container_bytes.extend_from_slice(VAULT_MAGIC);
        container_bytes.push(VAULT_FORMAT_VERSION);
        container_bytes.extend_from_slice(&state.key_version.to_be_bytes());
        container_bytes.extend_from_slice(&state.kek_salt);
        container_bytes.extend_from_slice(&wrapped_dek_nonce);
        container_bytes.extend_from_slice(&wrapped_dek);
        container_bytes.extend_from_slice(&payload_nonce);
        container_bytes.extend_from_slice(&payload_ciphertext);

        if let Some(parent_directory) = self.vault_file_path.parent() {
            fs::create_dir_all(parent_directory)?;
        }
        Self::write_atomic_owner_only(&self.vault_file_path, &container_bytes)
    }

    /// Escritura vía tempfile en el mismo directorio + rename. Un fallo de
    /// escritura deja el contenedor previo intacto.
    fn write_atomic_owner_only(target_path: &Path, content: &[u8]) -> Result<(), VaultError> {
        let temporary_path = target_path.with_extension("tmp");

        {
            let mut temporary_file = fs::File::create(&temporary_path)?;
            temporary_file.write_all(content)?;
            temporary_file.sync_all()?;
        }

        Self::enforce_owner_only_mode(&temporary_path)?;
        fs::rename(&temporary_path, target_path)?;
        Self::enforce_owner_only_mode(target_path)?;
        Ok(())
    }

    #[cfg(unix)]
    fn enforce_owner_only_mode(target_path: &Path) -> Result<(), VaultError> {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(target_path)?.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(target_path, permissions)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn enforce_owner_only_mode(_target_path: &Path) -> Result<(), VaultError> {
        Ok(())
    }
}
