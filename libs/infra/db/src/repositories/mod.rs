// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V12.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como una interfaz galvánica. Los sub-módulos
 * permanecen aislados y solo las estructuras de autoridad
 * (Repositories) son expuestas al exterior.
 * =================================================================
 */

// --- ESTRATO 1: CONJUNTO ACTIVO (TACTICAL) ---

/// Persistencia canónica del conjunto activo y política de fusión.
pub mod ip_records;

// --- ESTRATO 2: BITÁCORAS Y GOBERNANZA ---

/// Ledger append-only de corridas de recolección.
pub mod runs;
/// Espejo no-secreto de credenciales y veredictos de sonda.
pub mod credentials;
/// Auditoría de autenticación y candado de cinco strikes.
pub mod auth_attempts;

// --- ESTRATO 3: SISTEMA (CORE) ---

/// Metadatos globales: versión del conjunto activo y banderas de agenda.
pub mod system;

/// Codificación temporal compartida del Ledger (RFC 3339 de ancho fijo).
pub(crate) mod codec;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use auth_attempts::{AuthAttemptRepository, LockoutProbe};
pub use credentials::CredentialRegistryRepository;
pub use ip_records::{ActiveSetStats, IpRecordRepository};
pub use runs::CollectionRunRepository;
pub use system::SystemMetadataRepository;
