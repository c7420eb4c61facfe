// [tests/mirror/libs/core/vault/vault_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CICLO DE VIDA DE LA BÓVEDA (V2.3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: ALTA, RELECTURA, ROTACIÓN Y FAIL-CLOSED
 *
 * # Mathematical Proof (Fail-Closed Vault):
 * Un solo byte corrompido en el contenedor debe colapsar la apertura
 * completa: la etiqueta GCM convierte cualquier mutación en un
 * rechazo de integridad, jamás en una re-inicialización silenciosa.
 * =================================================================
 */

use blacklist_core_vault::{CredentialVault, VaultError};
use blacklist_domain_models::source::FeedSource;
use std::fs;

#[test]
fn certify_put_survives_reopen() {
    println!("\n🔐 [PROVING_GROUNDS]: Validating vault persistence roundtrip...");

    let proving_directory = tempfile::tempdir().expect("INFRA_FAULT: tempdir rejected");
    let vault_path = proving_directory.path().join("credential.vault");
    let seed_path = proving_directory.path().join("vault.seed");

    {
        let vault = CredentialVault::open(&vault_path, &seed_path)
            .expect("CRITICAL_FAULT: first-start vault rejected");
        vault
            .put(
                FeedSource::Regtech,
                "auditor".to_string(),
                "hunter-two".to_string(),
                Some("long-lived-bearer".to_string()),
            )
            .expect("CRITICAL_FAULT: vault put rejected");
    }

    // Relectura desde disco con la misma semilla de máquina.
    let reopened = CredentialVault::open(&vault_path, &seed_path)
        .expect("CRITICAL_FAULT: reopen rejected");
    let entry = reopened.get(FeedSource::Regtech).expect("entry vanished");

    assert_eq!(entry.username, "auditor");
    assert_eq!(entry.secret, "hunter-two");
    assert_eq!(entry.bearer_token.as_deref(), Some("long-lived-bearer"));
    assert!(matches!(
        reopened.get(FeedSource::Secudium),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn certify_rotation_bumps_key_version_and_preserves_entries() {
    let proving_directory = tempfile::tempdir().expect("INFRA_FAULT: tempdir rejected");
    let vault_path = proving_directory.path().join("credential.vault");
    let seed_path = proving_directory.path().join("vault.seed");

    let vault = CredentialVault::open(&vault_path, &seed_path).expect("open rejected");
    vault
        .put(FeedSource::Secudium, "watcher".to_string(), "s3cret".to_string(), None)
        .expect("put rejected");

    let initial_key_version = vault.key_version();
    let rotated_key_version = vault.rotate().expect("rotation rejected");
    assert_eq!(rotated_key_version, initial_key_version + 1);

    // El material sobrevive a la DEK nueva, también tras relectura.
    let reopened = CredentialVault::open(&vault_path, &seed_path).expect("reopen rejected");
    assert_eq!(reopened.key_version(), rotated_key_version);
    assert_eq!(reopened.get(FeedSource::Secudium).unwrap().secret, "s3cret");
}

#[test]
fn certify_corrupted_container_fails_closed() {
    let proving_directory = tempfile::tempdir().expect("INFRA_FAULT: tempdir rejected");
    let vault_path = proving_directory.path().join("credential.vault");
    let seed_path = proving_directory.path().join("vault.seed");

    {
        let vault = CredentialVault::open(&vault_path, &seed_path).expect("open rejected");
        vault
            .put(FeedSource::Regtech, "auditor".to_string(), "material".to_string(), None)
            .expect("put rejected");
    }

    // Mutación de un byte del payload cifrado.
    let mut container_bytes = fs::read(&vault_path).expect("container unreadable");
    let last_index = container_bytes.len() - 1;
    container_bytes[last_index] ^= 0xFF;
    fs::write(&vault_path, &container_bytes).expect("container rewrite rejected");

    let verdict = CredentialVault::open(&vault_path, &seed_path);
    assert!(
        matches!(&verdict, Err(VaultError::Corrupt(_))),
        "a mutated container must refuse to open"
    );
}

#[cfg(unix)]
#[test]
fn certify_owner_only_mode_enforced() {
    use std::os::unix::fs::PermissionsExt;

    let proving_directory = tempfile::tempdir().expect("INFRA_FAULT: tempdir rejected");
    let vault_path = proving_directory.path().join("credential.vault");
    let seed_path = proving_directory.path().join("vault.seed");

    let vault = CredentialVault::open(&vault_path, &seed_path).expect("open rejected");
    vault
        .put(FeedSource::Regtech, "auditor".to_string(), "material".to_string(), None)
        .expect("put rejected");

    for guarded_path in [&vault_path, &seed_path] {
        let mode = fs::metadata(guarded_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "{} must be owner-only", guarded_path.display());
    }
}
