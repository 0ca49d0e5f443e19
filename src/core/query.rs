//! Query parameters and pagination utilities

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::store::{FindMany, OrderBy};

/// Page used when none (or garbage) is requested
pub const DEFAULT_PAGE: usize = 1;

/// Page size used when none (or garbage) is requested
pub const DEFAULT_LIMIT: usize = 10;

/// Raw paging parameters from a URL query string
///
/// Values are kept as strings so that malformed input falls back to the
/// defaults instead of rejecting the request.
///
/// # Example
/// ```rust,ignore
/// pub async fn list_services(
///     State(repo): State<Repository<InMemoryStore>>,
///     Query(query): Query<PageQuery>,
/// ) -> BazaarResult<ListResult<Value>> {
///     Ok(repo.paginate_from_query(&query).find_all(query.to_find_many()).await?)
/// }
///
/// // Usage:
/// GET /services?page=2&limit=10
/// GET /services?page=1&limit=20&filter={"price>": 100}&sort=price:desc
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PageQuery {
    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Number of items per page
    pub limit: Option<String>,

    /// Filters as a JSON object, passed to the store as the `where` clause
    pub filter: Option<String>,

    /// Sort expression, `field`, `field:asc` or `field:desc`
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn new(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
            ..Self::default()
        }
    }

    /// Parse filter JSON string into Value
    pub fn filter_value(&self) -> Option<Value> {
        self.filter
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    /// Store arguments carrying this query's filter and sort (no paging)
    pub fn to_find_many(&self) -> FindMany {
        FindMany {
            filter: self.filter_value(),
            order_by: self
                .sort
                .as_deref()
                .and_then(OrderBy::parse)
                .into_iter()
                .collect(),
            ..FindMany::default()
        }
    }
}

/// Parse a positive integer; anything else yields `None`
fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as usize)
}

/// Resolved paging intent for a single list query
///
/// Immutable: every builder returns a new value, so one configuration can
/// never leak into another request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    page: usize,
    limit: usize,
    skip: usize,
    active: bool,
    default_limit: usize,
    max_limit: Option<usize>,
}

impl Default for Paging {
    fn default() -> Self {
        Self::with_default_limit(DEFAULT_LIMIT)
    }
}

impl Paging {
    /// Inactive paging whose page size defaults to `limit`
    pub fn with_default_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            page: DEFAULT_PAGE,
            limit,
            skip: 0,
            active: false,
            default_limit: limit,
            max_limit: None,
        }
    }

    /// Cap every page size this paging will use, the default included
    ///
    /// The cap applies before `skip` is derived, so `skip` always equals
    /// `(page - 1) * limit` for the capped limit.
    pub fn with_max_limit(self, max: usize) -> Self {
        let max = max.max(1);
        let capped = Self {
            max_limit: Some(max),
            default_limit: self.default_limit.min(max),
            ..self
        };
        Self {
            limit: capped.cap(self.limit),
            ..capped
        }
    }

    /// Active paging from raw `page`/`limit` parameters
    ///
    /// Missing, unparsable, zero or negative values fall back to page 1 and
    /// the default page size.
    pub fn with_params(self, page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = self.cap(parse_positive(limit).unwrap_or(self.default_limit));
        Self {
            page,
            limit,
            skip: skip_for(page, limit),
            active: true,
            ..self
        }
    }

    /// Set the page; recomputes `skip` from the current limit
    pub fn with_page(self, page: usize) -> Self {
        let page = page.max(1);
        Self {
            page,
            skip: skip_for(page, self.limit),
            active: true,
            ..self
        }
    }

    /// Set the page size; `skip` is left untouched
    pub fn with_limit(self, limit: usize) -> Self {
        Self {
            limit: self.cap(limit.max(1)),
            active: true,
            ..self
        }
    }

    /// Override the number of records to skip
    pub fn with_skip(self, skip: usize) -> Self {
        Self {
            skip,
            active: true,
            ..self
        }
    }

    fn cap(&self, limit: usize) -> usize {
        match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn max_limit(&self) -> Option<usize> {
        self.max_limit
    }
}

/// Records before `page`; saturates for absurd page numbers
fn skip_for(page: usize, limit: usize) -> usize {
    (page - 1).saturating_mul(limit)
}

/// One page of records plus the total matching the same filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    /// `ceil(total / limit)`, `0` for an empty collection
    pub last_page: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            last_page: total.div_ceil(limit as u64),
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as u64) < self.last_page
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            total: self.total,
            page: self.page,
            limit: self.limit,
            last_page: self.last_page,
            has_next: self.has_next(),
            has_prev: self.has_prev(),
        }
    }
}

/// Pagination metadata sent to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub last_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Result of a repository list read
#[derive(Debug, Clone, PartialEq)]
pub enum ListResult<T> {
    /// Pagination inactive: the store's result, untouched
    All(Vec<T>),
    /// Pagination active
    Page(Paginated<T>),
}

impl<T> ListResult<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListResult::All(items) => items,
            ListResult::Page(page) => &page.items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResult::All(items) => items,
            ListResult::Page(page) => page.items,
        }
    }

    pub fn as_page(&self) -> Option<&Paginated<T>> {
        match self {
            ListResult::All(_) => None,
            ListResult::Page(page) => Some(page),
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, ListResult::Page(_))
    }

    /// The JSON envelope sent to clients
    pub fn into_response_body(self) -> ListResponse<T> {
        match self {
            ListResult::All(data) => ListResponse { data, meta: None },
            ListResult::Page(page) => {
                let meta = page.meta();
                ListResponse {
                    data: page.items,
                    meta: Some(meta),
                }
            }
        }
    }
}

/// `{"data": [...], "meta": {...}}`; `meta` only when paginated
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T: Serialize> IntoResponse for ListResult<T> {
    fn into_response(self) -> Response {
        Json(self.into_response_body()).into_response()
    }
}
