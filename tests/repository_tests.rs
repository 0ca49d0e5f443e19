//! Integration tests for paginated repositories
//!
//! Runs the repository against the in-memory store and against stores that
//! fail, checking the paging arithmetic and error propagation.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bazaar::core::error::StorageError;
use bazaar::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Helpers
// =============================================================================

fn services(n: usize) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_records(
        "services",
        (1..=n).map(|i| json!({"title": format!("Service {}", i), "price": i * 10})),
    ))
}

/// Store whose reads fail; counts the calls it receives
#[derive(Default)]
struct FailingStore {
    fail_find: bool,
    fail_count: bool,
    finds: AtomicUsize,
    counts: AtomicUsize,
}

#[async_trait]
impl CollectionStore for FailingStore {
    type Record = Value;

    async fn find_many(&self, _args: FindMany) -> Result<Vec<Value>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail_find {
            return Err(StorageError::Unavailable {
                backend: "postgres".to_string(),
            }
            .into());
        }
        Ok(vec![json!({"id": 1})])
    }

    async fn count(&self, _args: Count) -> Result<u64> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        if self.fail_count {
            return Err(anyhow!("connection reset while counting"));
        }
        Ok(1)
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn create(&self, data: Value) -> Result<Value> {
        Ok(data)
    }

    async fn update(&self, _id: i64, data: Value) -> Result<Value> {
        Ok(data)
    }

    async fn delete(&self, _id: i64) -> Result<Value> {
        Ok(Value::Null)
    }
}

// =============================================================================
// Paging intent
// =============================================================================

#[test]
fn test_skip_is_page_minus_one_times_limit() {
    let repo = Repository::new(services(0));
    for page in 1..=6usize {
        for limit in [1usize, 3, 10, 25] {
            let paged = repo.paginate_from_params(Some(&page.to_string()), Some(&limit.to_string()));
            assert_eq!(paged.paging().skip(), (page - 1) * limit);
            assert!(paged.paging().is_active());
        }
    }
}

#[test]
fn test_garbage_params_fall_back_to_defaults() {
    let repo = Repository::new(services(0));
    let cases = [
        (None, None),
        (Some("abc"), Some("xyz")),
        (Some(""), Some("")),
        (Some("0"), Some("-5")),
        (Some("2.5"), None),
    ];
    for (page, limit) in cases {
        let paged = repo.paginate_from_params(page, limit);
        assert_eq!(paged.paging().page(), 1, "page for {:?}", page);
        assert_eq!(paged.paging().limit(), 10, "limit for {:?}", limit);
        assert_eq!(paged.paging().skip(), 0);
        assert!(paged.paging().is_active());
    }
}

#[tokio::test]
async fn test_enormous_page_reads_an_empty_window() {
    let repo = Repository::new(services(5))
        .paginate_from_params(Some("9223372036854775807"), Some("10"));
    assert_eq!(repo.paging().skip(), usize::MAX);

    let result = repo.find_all(FindMany::new()).await.unwrap();
    let page = result.as_page().unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);
    assert!(!page.has_next());
}

#[test]
fn test_paginate_from_query() {
    let repo = Repository::new(services(0));
    let paged = repo.paginate_from_query(&PageQuery::new(Some("3"), Some("4")));
    assert_eq!(paged.paging().page(), 3);
    assert_eq!(paged.paging().limit(), 4);
    assert_eq!(paged.paging().skip(), 8);
}

#[test]
fn test_repositories_do_not_share_paging() {
    let base = Repository::new(services(0));
    let first = base.paginate_from_params(Some("5"), Some("20"));
    let second = base.limit(3);

    assert!(!base.paging().is_active());
    assert_eq!(first.paging().limit(), 20);
    assert_eq!(second.paging().limit(), 3);
    assert_eq!(second.paging().skip(), 0);
}

// =============================================================================
// find_all
// =============================================================================

#[tokio::test]
async fn test_inactive_find_all_returns_store_result_unchanged() {
    let store = services(12);
    let repo = Repository::new(store.clone());

    let expected = store
        .find_many(FindMany::new().order_by(OrderBy::desc("price")))
        .await
        .unwrap();
    let result = repo
        .find_all(FindMany::new().order_by(OrderBy::desc("price")))
        .await
        .unwrap();

    assert!(!result.is_paginated());
    assert_eq!(result.into_items(), expected);
}

#[tokio::test]
async fn test_active_find_all_page_bounds() {
    for total in [0usize, 1, 9, 10, 11, 23] {
        let store = services(total);
        for limit in [1usize, 4, 10] {
            let repo = Repository::new(store.clone()).paginate_from_params(Some("1"), Some(&limit.to_string()));
            let result = repo.find_all(FindMany::new()).await.unwrap();
            let page = result.as_page().expect("pagination is active");

            assert!(page.items.len() <= limit);
            assert_eq!(page.total, total as u64);
            assert_eq!(page.last_page, (total as u64).div_ceil(limit as u64));
        }
    }
}

#[tokio::test]
async fn test_last_page_is_zero_for_empty_collection() {
    let repo = Repository::new(services(0)).paginate_from_params(None, None);
    let result = repo.find_all(FindMany::new()).await.unwrap();
    let page = result.as_page().unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.last_page, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let repo = Repository::new(services(5)).paginate_from_params(Some("4"), Some("2"));
    let result = repo.find_all(FindMany::new()).await.unwrap();
    let page = result.as_page().unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);
    assert_eq!(page.last_page, 3);
}

#[tokio::test]
async fn test_filter_applies_to_items_and_total() {
    let repo = Repository::new(services(20)).paginate_from_params(Some("2"), Some("5"));
    let result = repo
        .find_all(
            FindMany::new()
                .filter(json!({"price>": 100}))
                .order_by(OrderBy::asc("price")),
        )
        .await
        .unwrap();

    let page = result.as_page().unwrap();
    assert_eq!(page.total, 10);
    assert_eq!(page.last_page, 2);
    let prices: Vec<i64> = page.items.iter().filter_map(|r| r["price"].as_i64()).collect();
    assert_eq!(prices, vec![160, 170, 180, 190, 200]);
}

#[tokio::test]
async fn test_find_error_is_propagated_unchanged() {
    let store = Arc::new(FailingStore {
        fail_find: true,
        ..FailingStore::default()
    });
    let repo = Repository::new(store.clone()).page(1);

    let err = repo.find_all(FindMany::new()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Unavailable { backend }) if backend == "postgres"
    ));
    assert_eq!(store.counts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_count_error_aborts_without_partial_result() {
    let store = Arc::new(FailingStore {
        fail_count: true,
        ..FailingStore::default()
    });
    let repo = Repository::new(store.clone()).paginate_from_params(None, None);

    let err = repo.find_all(FindMany::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset while counting");
    assert_eq!(store.finds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_inactive_find_all_never_counts() {
    let store = Arc::new(FailingStore {
        fail_count: true,
        ..FailingStore::default()
    });
    let result = Repository::new(store.clone())
        .find_all(FindMany::new())
        .await
        .unwrap();
    assert_eq!(result.items().len(), 1);
    assert_eq!(store.counts.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Pass-throughs
// =============================================================================

#[tokio::test]
async fn test_crud_pass_through() {
    let repo = Repository::new(Arc::new(InMemoryStore::new("users")));

    let created = assert_ok!(repo.create(json!({"name": "Ana"})).await);
    let id = created["id"].as_i64().unwrap();

    let updated = assert_ok!(repo.update(id, json!({"name": "Bia"})).await);
    assert_eq!(updated["name"], "Bia");

    let found = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found, updated);

    repo.delete(id).await.unwrap();
    assert!(repo.find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_record_becomes_404() {
    let repo = Repository::new(Arc::new(InMemoryStore::new("users")));
    let err: BazaarError = assert_err!(repo.delete(42).await).into();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}
