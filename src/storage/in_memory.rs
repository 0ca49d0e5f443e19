//! In-memory implementation of CollectionStore for testing and development

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use crate::core::error::StorageError;
use crate::core::store::{CollectionStore, Count, FindMany, OrderBy, SortDirection};

const BACKEND: &str = "in-memory";

/// In-memory collection of JSON records with auto-increment `id`
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// The `where` clause supports exact matches and `field>`, `field<`,
/// `field>=`, `field<=` comparisons on numbers and strings.
#[derive(Clone)]
pub struct InMemoryStore {
    name: String,
    records: Arc<RwLock<Vec<Value>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryStore {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Create a collection seeded with `records`; each gets an `id`
    pub fn with_records(name: impl Into<String>, records: impl IntoIterator<Item = Value>) -> Self {
        let mut store = Self::new(name);
        let seeded = records
            .into_iter()
            .map(|record| store.assign_id(record))
            .collect();
        store.records = Arc::new(RwLock::new(seeded));
        store
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn assign_id(&self, record: Value) -> Value {
        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        fields.insert("id".to_string(), Value::from(id));
        Value::Object(fields)
    }

    fn query_error(message: impl Into<String>) -> anyhow::Error {
        StorageError::QueryError {
            backend: BACKEND.to_string(),
            message: message.into(),
        }
        .into()
    }

    fn not_found(&self, id: i64) -> anyhow::Error {
        StorageError::NotFound {
            collection: self.name.clone(),
            id,
        }
        .into()
    }
}

fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

/// Filter object, or an error for anything that is not one
fn filter_object(filter: Option<&Value>) -> Result<Option<&Map<String, Value>>> {
    match filter {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(InMemoryStore::query_error(format!(
            "where clause must be an object, got {}",
            other
        ))),
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches(record: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, expected)| {
        let (field, op) = if let Some(field) = key.strip_suffix(">=") {
            (field, ">=")
        } else if let Some(field) = key.strip_suffix("<=") {
            (field, "<=")
        } else if let Some(field) = key.strip_suffix('>') {
            (field, ">")
        } else if let Some(field) = key.strip_suffix('<') {
            (field, "<")
        } else {
            return record.get(key.as_str()) == Some(expected);
        };

        let Some(ordering) = record
            .get(field)
            .and_then(|actual| compare_values(actual, expected))
        else {
            return false;
        };
        match op {
            ">=" => ordering != Ordering::Less,
            "<=" => ordering != Ordering::Greater,
            ">" => ordering == Ordering::Greater,
            _ => ordering == Ordering::Less,
        }
    })
}

fn sort(records: &mut [Value], order_by: &[OrderBy]) {
    records.sort_by(|a, b| {
        for order in order_by {
            let ordering = match (a.get(&order.field), b.get(&order.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl CollectionStore for InMemoryStore {
    type Record = Value;

    async fn find_many(&self, args: FindMany) -> Result<Vec<Value>> {
        let filter = filter_object(args.filter.as_ref())?;
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut found: Vec<Value> = records
            .iter()
            .filter(|record| filter.is_none_or(|f| matches(record, f)))
            .cloned()
            .collect();
        drop(records);

        if !args.order_by.is_empty() {
            sort(&mut found, &args.order_by);
        }

        Ok(found
            .into_iter()
            .skip(args.skip.unwrap_or(0))
            .take(args.take.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, args: Count) -> Result<u64> {
        let filter = filter_object(args.filter.as_ref())?;
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .iter()
            .filter(|record| filter.is_none_or(|f| matches(record, f)))
            .count() as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .iter()
            .find(|record| record_id(record) == Some(id))
            .cloned())
    }

    async fn create(&self, data: Value) -> Result<Value> {
        if !data.is_object() {
            return Err(Self::query_error("records must be JSON objects"));
        }
        let record = self.assign_id(data);

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records.push(record.clone());

        Ok(record)
    }

    async fn update(&self, id: i64, data: Value) -> Result<Value> {
        let Value::Object(changes) = data else {
            return Err(Self::query_error("update data must be a JSON object"));
        };

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let record = records
            .iter_mut()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| self.not_found(id))?;

        if let Value::Object(fields) = record {
            for (key, value) in changes {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }

        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let position = records
            .iter()
            .position(|record| record_id(record) == Some(id))
            .ok_or_else(|| self.not_found(id))?;

        Ok(records.remove(position))
    }
}
