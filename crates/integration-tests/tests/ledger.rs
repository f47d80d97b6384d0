//! Ledger tests against a real PostgreSQL instance.
//!
//! All tests are ignored by default; point `DATABASE_URL` at a scratch
//! database and run with `-- --ignored`. Each test works on its own ISBNs
//! and purges them up front, so reruns and parallel execution stay clean.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use folio_core::{CatalogProduct, LedgerEntry, RefundEntry, TitleStatus};
use folio_integration_tests::db_pool;
use folio_server::db::{
    self, LedgerRepository, PreorderRepository, ReleaseOutcome, ReleaseRepository, RepositoryError,
};
use folio_server::services::AnomalyScanner;

async fn setup() -> PgPool {
    let pool = db_pool().await;
    db::initialize_schema(&pool, Path::new("../server/schema.sql"))
        .await
        .unwrap();
    pool
}

async fn purge(pool: &PgPool, isbn: &str) {
    for table in [
        "presales",
        "presales_log",
        "sales_log",
        "cancellation_log",
        "refund_log",
        "releases_log",
        "anomalies_log",
        "preorders",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE isbn = $1"))
            .bind(isbn)
            .execute(pool)
            .await
            .unwrap();
    }
}

fn product(isbn: &str, pub_date: Option<&str>, tagged: bool, inventory: i32) -> CatalogProduct {
    CatalogProduct {
        isbn: isbn.to_string(),
        title: Some("Test Title".to_string()),
        vendor: Some("Test Press".to_string()),
        pub_date: pub_date.map(str::to_string),
        tagged_preorder: tagged,
        in_preorder_collection: tagged,
        inventory,
    }
}

fn entry(isbn: &str, order_id: &str, quantity: i32) -> LedgerEntry {
    LedgerEntry {
        isbn: isbn.to_string(),
        order_id: order_id.to_string(),
        quantity,
        occurred_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_presale_replay_inserts_once() {
    let pool = setup().await;
    let isbn = "9790001000011";
    purge(&pool, isbn).await;

    let ledger = LedgerRepository::new(&pool);
    let entries = [entry(isbn, "replay-1001", 2)];

    assert_eq!(ledger.record_presales(&entries).await.unwrap(), 1);
    // Redelivery of the same order line inserts nothing.
    assert_eq!(ledger.record_presales(&entries).await.unwrap(), 0);

    let other_order = [entry(isbn, "replay-1002", 1)];
    assert_eq!(ledger.record_presales(&other_order).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_refund_replay_keyed_on_refund_date() {
    let pool = setup().await;
    let isbn = "9790001000028";
    purge(&pool, isbn).await;

    let ledger = LedgerRepository::new(&pool);
    let first_refund = [RefundEntry {
        isbn: isbn.to_string(),
        order_id: "replay-2001".to_string(),
        quantity: 1,
        refund_date: Utc.with_ymd_and_hms(2024, 5, 3, 10, 0, 0).unwrap(),
    }];

    assert_eq!(ledger.record_refund(&first_refund).await.unwrap(), 1);
    assert_eq!(ledger.record_refund(&first_refund).await.unwrap(), 0);

    // A later partial refund on the same order is a distinct event.
    let second_refund = [RefundEntry {
        refund_date: Utc.with_ymd_and_hms(2024, 5, 9, 10, 0, 0).unwrap(),
        ..first_refund[0].clone()
    }];
    assert_eq!(ledger.record_refund(&second_refund).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_cancellation_replay_inserts_once() {
    let pool = setup().await;
    let isbn = "9790001000035";
    purge(&pool, isbn).await;

    let ledger = LedgerRepository::new(&pool);
    let entries = [entry(isbn, "replay-3001", 1)];

    assert_eq!(ledger.record_cancellation(&entries).await.unwrap(), 1);
    assert_eq!(ledger.record_cancellation(&entries).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_sales_skip_managed_preorders() {
    let pool = setup().await;
    let managed = "9790001000042";
    let unmanaged = "9790001000059";
    purge(&pool, managed).await;
    purge(&pool, unmanaged).await;

    PreorderRepository::new(&pool)
        .sync(&[product(managed, Some("2024-09-01"), true, 10)])
        .await
        .unwrap();

    let ledger = LedgerRepository::new(&pool);
    // Managed title: the presale ledger owns it, sales_log stays empty.
    assert!(!ledger
        .record_sales(&[entry(managed, "sales-4001", 1)])
        .await
        .unwrap());
    // Unknown title: a plain sale.
    assert!(ledger
        .record_sales(&[entry(unmanaged, "sales-4002", 1)])
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_release_happens_exactly_once() {
    let pool = setup().await;
    let isbn = "1234567890123";
    purge(&pool, isbn).await;

    PreorderRepository::new(&pool)
        .sync(&[product(isbn, Some("2024-06-01"), true, 7)])
        .await
        .unwrap();

    let ledger = LedgerRepository::new(&pool);
    // Two presale orders before pub_date, one after.
    ledger
        .record_presales(&[entry(isbn, "rel-5001", 2), entry(isbn, "rel-5002", 3)])
        .await
        .unwrap();
    let mut late = entry(isbn, "rel-5003", 4);
    late.occurred_at = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
    ledger.record_presales(&[late]).await.unwrap();
    ledger.recompute_presales().await.unwrap();

    let releases = ReleaseRepository::new(&pool);
    let outcome = releases.release_preorder(isbn, "alice").await.unwrap();
    let ReleaseOutcome::Released(record) = outcome else {
        panic!("expected the first call to perform the release");
    };
    assert_eq!(record.total_presales, 5);
    assert_eq!(record.inventory_on_release, 7);
    assert_eq!(record.approved_by.as_deref(), Some("alice"));

    // Second approval is a no-op, not an error.
    let again = releases.release_preorder(isbn, "bob").await.unwrap();
    assert!(matches!(again, ReleaseOutcome::AlreadyReleased));
    let stored = releases.get(isbn).await.unwrap().unwrap();
    assert_eq!(stored.approved_by.as_deref(), Some("alice"));

    // The flag flip happened alongside the release row.
    let (tagged,): (bool,) =
        sqlx::query_as("SELECT tagged_preorder FROM preorders WHERE isbn = $1")
            .bind(isbn)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!tagged);

    let status = PreorderRepository::new(&pool)
        .title_status(isbn)
        .await
        .unwrap();
    assert_eq!(status, TitleStatus::Released);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_release_requires_an_eligible_preorder() {
    let pool = setup().await;
    let untagged = "9790001000066";
    let unknown = "9790001000073";
    purge(&pool, untagged).await;
    purge(&pool, unknown).await;

    PreorderRepository::new(&pool)
        .sync(&[product(untagged, Some("2024-06-01"), false, 3)])
        .await
        .unwrap();

    let releases = ReleaseRepository::new(&pool);
    let outcome = releases.release_preorder(untagged, "alice").await.unwrap();
    assert!(matches!(outcome, ReleaseOutcome::NotEligible));
    let outcome = releases.release_preorder(unknown, "alice").await.unwrap();
    assert!(matches!(outcome, ReleaseOutcome::NotEligible));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_anomaly_scan_never_retimestamps() {
    let pool = setup().await;
    let isbn = "9790001000080";
    purge(&pool, isbn).await;

    PreorderRepository::new(&pool)
        .sync(&[product(isbn, None, true, 0)])
        .await
        .unwrap();

    AnomalyScanner::new(&pool).scan().await.unwrap();
    let (first_seen,): (chrono::DateTime<Utc>,) = sqlx::query_as(
        "SELECT timestamp FROM anomalies_log WHERE isbn = $1 AND reason = 'Missing pub_date'",
    )
    .bind(isbn)
    .fetch_one(&pool)
    .await
    .unwrap();

    // A second sweep sees the same condition and leaves the row alone.
    AnomalyScanner::new(&pool).scan().await.unwrap();
    let rows: Vec<(chrono::DateTime<Utc>,)> =
        sqlx::query_as("SELECT timestamp FROM anomalies_log WHERE isbn = $1")
            .bind(isbn)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, first_seen);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_title_status_unknown_isbn_is_not_found() {
    let pool = setup().await;
    let result = PreorderRepository::new(&pool)
        .title_status("9790009999999")
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
