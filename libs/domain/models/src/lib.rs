// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V9.0 - SINGLE SOURCE OF TRUTH)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE ENTIDADES Y CONTRATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FEED SOVEREIGNTY: Centraliza las entidades del pipeline de
 *    inteligencia (IpRecord, CollectionRun, Credential) para que
 *    todos los estratos compartan un único contrato de datos.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

pub mod analytics;
pub mod clock;
pub mod credential;
pub mod feed;
pub mod record;
pub mod run;
pub mod source;
pub mod threat;

pub use analytics::{
    AnalyticsWindow, DailyBucket, FortigateEntry, FortigateEnvelope, SourceRunSummary,
    SummaryReport,
};
pub use clock::DateRange;
pub use credential::{AuthAttempt, CredentialMetadata};
pub use feed::RawFeedRecord;
pub use record::{IpRecord, IpRecordView};
pub use run::{CollectionRun, RunErrorKind, RunStatus, UpsertStats};
pub use source::FeedSource;
pub use threat::ThreatLevel;
