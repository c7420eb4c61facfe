// [tests/mirror/libs/infra/cache/tiered_fallback.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL ESTRATO DE CACHÉ (V2.3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: FALLBACK EN PROCESO, VERSIONADO Y DEGRADACIÓN
 *
 * # Mathematical Proof (Version Miss):
 * La versión forma parte de la llave compuesta: tras un bump, toda
 * lectura bajo la versión previa es estructuralmente inalcanzable.
 * =================================================================
 */

use blacklist_infra_cache::{CacheTierState, TieredCache};

#[tokio::test]
async fn certify_memory_tier_serves_without_primary() {
    println!("\n🗄️  [PROVING_GROUNDS]: Validating memory-only tier service...");

    let cache = TieredCache::connect(None, 16, 1).await;
    assert_eq!(cache.tier_state(), CacheTierState::MemoryOnly);

    cache.store("active", "plain", "1.2.3.4\n5.6.7.8".to_string(), 300).await;

    // Lecturas consecutivas del respaldo entregan el mismo cuerpo.
    let first_read = cache.fetch("active", "plain").await;
    let second_read = cache.fetch("active", "plain").await;
    assert_eq!(first_read.as_deref(), Some("1.2.3.4\n5.6.7.8"));
    assert_eq!(first_read, second_read);
}

#[tokio::test]
async fn certify_version_bump_invalidates_reads() {
    let cache = TieredCache::connect(None, 16, 7).await;
    cache.store("fortigate", "json", "{\"entries\":[]}".to_string(), 300).await;
    assert!(cache.fetch("fortigate", "json").await.is_some());

    // El bump post-commit convierte la lectura en miss estructural.
    cache.bump_version(8);
    assert_eq!(cache.current_version(), 8);
    assert!(cache.fetch("fortigate", "json").await.is_none());

    // El bump es monótono: una versión rezagada jamás retrocede.
    cache.bump_version(3);
    assert_eq!(cache.current_version(), 8);
}

#[tokio::test]
async fn certify_fallback_ceiling_evicts_lru() {
    let cache = TieredCache::connect(None, 2, 1).await;

    cache.store("summary", "window=7d", "seven".to_string(), 300).await;
    cache.store("summary", "window=30d", "thirty".to_string(), 300).await;
    // Toque de la primera llave: pasa a ser la más reciente.
    assert!(cache.fetch("summary", "window=7d").await.is_some());

    // Tercera llave: el techo expulsa a la menos usada (30d).
    cache.store("summary", "window=90d", "ninety".to_string(), 300).await;

    assert!(cache.fetch("summary", "window=7d").await.is_some());
    assert!(cache.fetch("summary", "window=30d").await.is_none());
    assert!(cache.fetch("summary", "window=90d").await.is_some());
}

#[tokio::test]
async fn certify_ttl_expiry_in_fallback_tier() {
    let cache = TieredCache::connect(None, 16, 1).await;
    cache.store("enhanced", "json", "[]".to_string(), 0).await;

    // TTL cero: la entrada nace vencida y la lectura es miss.
    assert!(cache.fetch("enhanced", "json").await.is_none());
}

#[tokio::test]
async fn certify_unreachable_primary_reports_degraded() {
    // Primario declarado pero inalcanzable: el estrato degrada,
    // jamás 'unhealthy', y el respaldo sigue sirviendo.
    let cache = TieredCache::connect(Some("redis://127.0.0.1:1/"), 16, 1).await;
    assert_eq!(cache.tier_state(), CacheTierState::Degraded);

    cache.store("active", "plain", "9.9.9.9".to_string(), 300).await;
    assert_eq!(cache.fetch("active", "plain").await.as_deref(), Some("9.9.9.9"));
}
