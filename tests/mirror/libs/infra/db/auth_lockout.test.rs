// [tests/mirror/libs/infra/db/auth_lockout.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CANDADO DE CINCO STRIKES (V2.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: RACHAS DE FALLO, CORTE POR ÉXITO Y VENTANA
 * =================================================================
 */

use blacklist_domain_models::credential::AuthAttempt;
use blacklist_domain_models::source::FeedSource;
use blacklist_infra_db::repositories::AuthAttemptRepository;
use blacklist_infra_db::LedgerClient;
use chrono::{DateTime, Duration, Utc};

fn attempt(success: bool, when: DateTime<Utc>) -> AuthAttempt {
    AuthAttempt {
        source: FeedSource::Regtech,
        username: "auditor".to_string(),
        when,
        success,
        failure_reason: (!success).then(|| "login rejected".to_string()),
        remote_ip: None,
    }
}

#[tokio::test]
async fn certify_five_strikes_lock_within_window() {
    println!("\n⛔ [PROVING_GROUNDS]: Validating five-strikes lockout...");

    let database_client =
        LedgerClient::connect("file:mem_lockout_v21?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT: memory ledger rejected");
    let audit = AuthAttemptRepository::new(database_client);

    let now = Utc::now();
    for strike_index in 0..5 {
        audit
            .record(&attempt(false, now - Duration::minutes(5 - strike_index)))
            .await
            .unwrap();
    }

    let probe = audit.probe_lockout(FeedSource::Regtech).await.unwrap();
    assert_eq!(probe.consecutive_failures, 5);
    assert!(probe.is_locked(5, Duration::hours(1), now), "five strikes must lock");

    // Cuatro strikes no bastan para el candado.
    assert!(!probe.is_locked(6, Duration::hours(1), now));
}

#[tokio::test]
async fn certify_success_cuts_the_streak() {
    let database_client =
        LedgerClient::connect("file:mem_lockout_cut_v21?mode=memory&cache=shared", None)
            .await
            .unwrap();
    let audit = AuthAttemptRepository::new(database_client);

    let now = Utc::now();
    for minute in 0..4 {
        audit.record(&attempt(false, now - Duration::minutes(10 - minute))).await.unwrap();
    }
    audit.record(&attempt(true, now - Duration::minutes(2))).await.unwrap();
    audit.record(&attempt(false, now - Duration::minutes(1))).await.unwrap();

    // El éxito intermedio corta la racha: solo cuenta el fallo posterior.
    let probe = audit.probe_lockout(FeedSource::Regtech).await.unwrap();
    assert_eq!(probe.consecutive_failures, 1);
    assert!(!probe.is_locked(5, Duration::hours(1), now));
}

#[tokio::test]
async fn certify_block_window_elapses() {
    let database_client =
        LedgerClient::connect("file:mem_lockout_window_v21?mode=memory&cache=shared", None)
            .await
            .unwrap();
    let audit = AuthAttemptRepository::new(database_client);

    // Cinco strikes viejos: la ventana de bloqueo ya venció.
    let stale_instant = Utc::now() - Duration::hours(3);
    for minute in 0..5 {
        audit
            .record(&attempt(false, stale_instant - Duration::minutes(minute)))
            .await
            .unwrap();
    }

    let probe = audit.probe_lockout(FeedSource::Regtech).await.unwrap();
    assert_eq!(probe.consecutive_failures, 5);
    assert!(
        !probe.is_locked(5, Duration::hours(1), Utc::now()),
        "an elapsed block window must release the source"
    );
}
