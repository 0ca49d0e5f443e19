//! Request input and dot-path access
//!
//! Field values are looked up in the merge of body, query string and path
//! parameters. Precedence is fixed: **body < query < params**, so a path
//! parameter always wins over a body field of the same name.

use serde_json::{Map, Value};

use crate::core::auth::AuthContext;

/// Everything a form request can read from the in-flight request
#[derive(Debug, Clone)]
pub struct RequestData {
    /// Decoded JSON body; non-object bodies contribute no fields
    pub body: Value,
    /// Query-string parameters
    pub query: Map<String, Value>,
    /// Path parameters
    pub params: Map<String, Value>,
    /// Caller identity
    pub auth: AuthContext,
}

impl Default for RequestData {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            query: Map::new(),
            params: Map::new(),
            auth: AuthContext::Anonymous,
        }
    }
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    /// Body, then query, then params merged into one object (later wins)
    pub fn merged(&self) -> Value {
        let mut merged = match &self.body {
            Value::Object(body) => body.clone(),
            _ => Map::new(),
        };
        for (key, value) in self.query.iter().chain(self.params.iter()) {
            merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
    }
}

/// Look up a dot-separated path; numeric segments index into arrays
pub fn get_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at a dot-separated path, creating (or replacing non-object)
/// intermediate containers with objects
pub fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = target;
    for segment in segments {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert(last.to_string(), value);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

/// Copy only the declared paths of `data` into a fresh nested object
///
/// Absent paths are skipped; explicit `null` is kept.
pub fn extract_paths<'a>(data: &Value, paths: impl IntoIterator<Item = &'a str>) -> Value {
    let mut out = Value::Object(Map::new());
    for path in paths {
        if let Some(value) = get_path(data, path) {
            set_path(&mut out, path, value.clone());
        }
    }
    out
}
