//! Ledger tests against a live PostgreSQL database.
//!
//! Each test uses its own randomly generated primary account, so tests can
//! share one database without truncating it.

use std::{sync::Arc, time::Duration};

use ledger_server::{
    db,
    error::LedgerError,
    models::UserId,
    services::LedgerService,
    store::{LedgerStore, PgLedgerStore},
};

async fn setup_ledger(issuance: i64) -> (LedgerService, PgLedgerStore) {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = db::create_pool(&database_url, 5)
        .await
        .expect("Failed to connect to DB");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let store = PgLedgerStore::new(pool);
    let ledger = LedgerService::new(
        Arc::new(store.clone()),
        UserId::generate(),
        Duration::from_secs(5),
    );
    ledger
        .ensure_primary(issuance)
        .await
        .expect("Failed to seed primary account");

    (ledger, store)
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_seeding_and_issuance_limit() {
    let (ledger, _) = setup_ledger(100).await;

    let user = ledger.create_user(50).await.unwrap();
    assert_eq!(ledger.get_user(&user.id).await.unwrap().balance, 50);
    assert_eq!(ledger.get_user(ledger.primary()).await.unwrap().balance, 50);

    let err = ledger.create_user(60).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance(_)));
    assert_eq!(ledger.get_user(ledger.primary()).await.unwrap().balance, 50);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_failed_transfer_leaves_no_trace() {
    let (ledger, store) = setup_ledger(100).await;
    let a = ledger.create_user(39).await.unwrap().id;
    let b = ledger.create_user(0).await.unwrap().id;

    let err = ledger.create_transfer(&a, &b, 40).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance(_)));

    assert_eq!(store.fetch_user(&a).await.unwrap().unwrap().balance, 39);
    assert_eq!(store.fetch_user(&b).await.unwrap().unwrap().balance, 0);

    let balances = ledger.create_transfer(&a, &b, 39).await.unwrap();
    assert_eq!(balances, (0, 39));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires PostgreSQL database"]
async fn test_opposite_transfers_complete() {
    let (ledger, _) = setup_ledger(2_000).await;
    let ledger = Arc::new(ledger);
    let a = ledger.create_user(1_000).await.unwrap().id;
    let b = ledger.create_user(1_000).await.unwrap().id;

    let mut handles = Vec::new();
    for i in 0..20 {
        let ledger = Arc::clone(&ledger);
        let (from, to) = if i % 2 == 0 {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        handles.push(tokio::spawn(async move {
            ledger.create_transfer(&from, &to, 5).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.get_user(&a).await.unwrap().balance, 1_000);
    assert_eq!(ledger.get_user(&b).await.unwrap().balance, 1_000);
}
