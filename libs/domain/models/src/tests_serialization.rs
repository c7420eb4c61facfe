// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V9.1 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE LOS CONTRATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE PARITY: Valida que los enums del pipeline viajen en
 *    minúsculas/snake_case, idénticos al contrato HTTP del §API.
 * 2. ATTRIBUTION INTEGRITY: Certifica que el conjunto de fuentes
 *    sobreviva el roundtrip sin reordenamientos espurios.
 * =================================================================
 */
