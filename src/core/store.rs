//! Backing store capability interface
//!
//! Repositories never talk to a database directly; they go through a
//! [`CollectionStore`] handle that is injected at construction time.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction for [`OrderBy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`
    pub fn parse(expr: &str) -> Option<Self> {
        let (field, direction) = match expr.split_once(':') {
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some(_) => return None,
            None => (expr, SortDirection::Asc),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Arguments of a `find_many` call
///
/// `filter` is serialized as `where`:
/// - Exact match: `{"status": "active"}`
/// - Comparison: `{"price>": 10, "price<=": 50}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindMany {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,

    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,

    /// Relations to load alongside each record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

impl FindMany {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }

    /// The count arguments matching this query (only the `where` clause)
    pub fn to_count(&self) -> Count {
        Count {
            filter: self.filter.clone(),
        }
    }
}

/// Arguments of a `count` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Count {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

/// Capability interface of a backing collection
///
/// All errors are store specific and travel as `anyhow::Error`; callers in
/// this crate propagate them unchanged.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Record type returned by reads
    type Record: Send + Sync + Serialize;

    /// Find records matching `args`
    async fn find_many(&self, args: FindMany) -> Result<Vec<Self::Record>>;

    /// Count records matching the `where` clause
    async fn count(&self, args: Count) -> Result<u64>;

    /// Find one record by primary key
    async fn find_by_id(&self, id: i64) -> Result<Option<Self::Record>>;

    /// Create a record from raw data
    async fn create(&self, data: Value) -> Result<Self::Record>;

    /// Update a record by primary key
    async fn update(&self, id: i64, data: Value) -> Result<Self::Record>;

    /// Delete a record by primary key
    async fn delete(&self, id: i64) -> Result<Self::Record>;
}
