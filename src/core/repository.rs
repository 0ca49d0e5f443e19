//! Paginated repository over a [`CollectionStore`]
//!
//! A [`Repository`] is a cheap value: an injected store handle plus the
//! paging intent for one list query. Builders return new values, so build a
//! repository per request from a shared base.
//!
//! ```rust,ignore
//! let services = Repository::new(store.clone());
//!
//! // GET /services?page=2&limit=5
//! let result = services
//!     .paginate_from_query(&query)
//!     .find_all(FindMany::new().filter(json!({"providerId": 3})))
//!     .await?;
//! ```

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::core::query::{ListResult, PageQuery, Paginated, Paging};
use crate::core::store::{CollectionStore, FindMany};

/// Paging-aware access to a single backing collection
pub struct Repository<S: CollectionStore + ?Sized> {
    store: Arc<S>,
    paging: Paging,
}

impl<S: CollectionStore + ?Sized> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            paging: self.paging,
        }
    }
}

impl<S: CollectionStore + ?Sized> std::fmt::Debug for Repository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("paging", &self.paging)
            .finish()
    }
}

impl<S: CollectionStore + ?Sized> Repository<S> {
    /// Repository with default paging (inactive, page size 10)
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            paging: Paging::default(),
        }
    }

    /// Repository using the configured default page size and cap
    pub fn with_config(store: Arc<S>, config: &PaginationConfig) -> Self {
        let paging = Paging::with_default_limit(config.default_limit);
        let paging = match config.max_limit {
            Some(max) => paging.with_max_limit(max),
            None => paging,
        };
        Self { store, paging }
    }

    /// The injected store handle
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The paging intent of this repository value
    pub fn paging(&self) -> Paging {
        self.paging
    }

    fn with_paging(&self, paging: Paging) -> Self {
        Self {
            store: Arc::clone(&self.store),
            paging,
        }
    }

    /// Activate pagination from raw `page`/`limit` request parameters
    pub fn paginate_from_params(&self, page: Option<&str>, limit: Option<&str>) -> Self {
        self.with_paging(self.paging.with_params(page, limit))
    }

    /// Activate pagination from a decoded query string
    pub fn paginate_from_query(&self, query: &PageQuery) -> Self {
        self.paginate_from_params(query.page.as_deref(), query.limit.as_deref())
    }

    /// Set the page; `skip` follows the current limit
    pub fn page(&self, page: usize) -> Self {
        self.with_paging(self.paging.with_page(page))
    }

    /// Set the page size
    pub fn limit(&self, limit: usize) -> Self {
        self.with_paging(self.paging.with_limit(limit))
    }

    /// Override the number of records to skip
    pub fn skip(&self, skip: usize) -> Self {
        self.with_paging(self.paging.with_skip(skip))
    }

    /// List records, paginated when paging is active
    ///
    /// Inactive paging issues a single `find_many(args)` and returns its
    /// records untouched. Active paging issues `find_many` with the paging
    /// window (overriding any `skip`/`take` in `args`) followed by `count` on
    /// the `where` clause alone. Store errors are returned as-is.
    pub async fn find_all(&self, args: FindMany) -> Result<ListResult<S::Record>> {
        if !self.paging.is_active() {
            let items = self.store.find_many(args).await?;
            return Ok(ListResult::All(items));
        }

        let count_args = args.to_count();
        let page_args = FindMany {
            skip: Some(self.paging.skip()),
            take: Some(self.paging.limit()),
            ..args
        };

        tracing::debug!(
            page = self.paging.page(),
            limit = self.paging.limit(),
            skip = self.paging.skip(),
            "listing paginated records"
        );

        let items = self.store.find_many(page_args).await?;
        let total = self.store.count(count_args).await?;

        Ok(ListResult::Page(Paginated::new(
            items,
            total,
            self.paging.page(),
            self.paging.limit(),
        )))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<S::Record>> {
        self.store.find_by_id(id).await
    }

    pub async fn create(&self, data: Value) -> Result<S::Record> {
        self.store.create(data).await
    }

    pub async fn update(&self, id: i64, data: Value) -> Result<S::Record> {
        self.store.update(id, data).await
    }

    pub async fn delete(&self, id: i64) -> Result<S::Record> {
        self.store.delete(id).await
    }
}
