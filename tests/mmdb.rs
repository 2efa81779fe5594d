use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serial_test::serial;

use geoacl::app_context::AppContext;
use geoacl::config::{Config, LookupBackendKind};
use geoacl::resolver::mmdb::global_database;
use geoacl::resolver::CountryLookup;
use geoacl::{Reason, Verdict};

// kept apart from the other integration tests: these load a database into the
// process-wide instance, which those expect to stay empty

const TEST_DB: &str = "./test_material/geoip/geoacl-country-test.mmdb";
const TEST_DB_V2: &str = "./test_material/geoip/geoacl-country-test-v2.mmdb";

fn mmdb_context(path: &Path) -> AppContext {
    AppContext::new(Config {
        lookup_backend: LookupBackendKind::Mmdb,
        mmdb_path: Some(path.display().to_string()),
        peers: HashMap::from([
            ("trunk-eu".to_string(), "DE,FR".to_string()),
            ("partner".to_string(), "!RU,!KP".to_string()),
        ]),
        ..Config::default()
    })
    .unwrap()
}

#[tokio::test]
#[serial]
async fn test_app_context_with_database() {
    let ctx = mmdb_context(Path::new(TEST_DB));
    let db = global_database().unwrap();
    assert!(db.snapshot().is_loaded());
    assert_eq!(ctx.geo_acl.resolver().provider().generation(), db.generation());

    let trunk = ctx.peers.allowed_countries("trunk-eu").await.unwrap();
    let partner = ctx.peers.allowed_countries("partner").await.unwrap();
    let de = "5.9.0.1".parse().unwrap();
    let ru = "5.8.0.1".parse().unwrap();
    let gb = "81.2.69.160".parse().unwrap();
    let not_in_database = "8.8.8.8".parse().unwrap();

    assert_eq!(
        ctx.geo_acl.evaluate(de, &trunk, "trunk-eu").await.unwrap(),
        Verdict::allow(Reason::InAllowList)
    );
    assert_eq!(
        ctx.geo_acl.evaluate(gb, &trunk, "trunk-eu").await.unwrap(),
        Verdict::deny(Reason::NotInAllowList)
    );
    assert_eq!(
        ctx.geo_acl.evaluate(ru, &partner, "partner").await.unwrap(),
        Verdict::deny(Reason::InDenyList)
    );
    assert_eq!(
        ctx.geo_acl.evaluate(gb, &partner, "partner").await.unwrap(),
        Verdict::allow(Reason::NotInDenyList)
    );
    assert_eq!(
        ctx.geo_acl
            .evaluate(not_in_database, &trunk, "trunk-eu")
            .await
            .unwrap(),
        Verdict::deny(Reason::CountryUnknown)
    );
    assert_eq!(
        ctx.geo_acl
            .evaluate(not_in_database, &partner, "partner")
            .await
            .unwrap(),
        Verdict::allow(Reason::NotInDenyList)
    );
}

#[tokio::test]
#[serial]
async fn test_database_reload_changes_verdicts() {
    let path = std::env::temp_dir().join("geoacl-integration-reload.mmdb");
    std::fs::copy(TEST_DB, &path).unwrap();
    let ctx = mmdb_context(&path);
    let db = global_database().unwrap();
    let before = db.generation();

    let trunk = ctx.peers.allowed_countries("trunk-eu").await.unwrap();
    let ip = "5.9.0.1".parse().unwrap();
    assert!(ctx.geo_acl.check(ip, &trunk, "trunk-eu").await);

    std::fs::copy(TEST_DB_V2, &path).unwrap();
    let db_2 = db.clone();
    let path_2 = path.clone();
    let generation = tokio::task::spawn_blocking(move || db_2.reload_from_file(&path_2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(generation, before + 1);

    // cached resolutions from the previous data are dropped
    assert!(!ctx.geo_acl.check(ip, &trunk, "trunk-eu").await);
    assert!(ctx.geo_acl.check(ip, "AT", "trunk-eu").await);

    // every context shares the same database
    let other = mmdb_context(&path);
    assert!(Arc::ptr_eq(
        other.geo_acl.resolver().provider().as_mmdb().unwrap().database(),
        &db
    ));

    std::fs::remove_file(path).unwrap_or_default();
}
