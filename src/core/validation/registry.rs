//! Custom rule handlers
//!
//! Rules that are not built in are resolved by name in a [`RuleRegistry`].
//! A handler returns `Ok(None)` when the value passes, `Ok(Some(message))`
//! when it fails, and `Err` for faults (e.g. a lookup that could not run),
//! which the pipeline turns into an internal error.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::data::RequestData;
use super::validators::BUILTIN_RULES;

/// Rule configuration errors; these are programming mistakes in a form,
/// never client errors
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("unknown validation rule '{rule}' on field '{field}'")]
    UnknownRule { field: String, rule: String },

    #[error("rule '{rule}' on field '{field}' requires a parameter")]
    MissingParameter { field: String, rule: String },

    #[error("invalid parameter '{param}' for rule '{rule}' on field '{field}': {message}")]
    InvalidParameter {
        field: String,
        rule: String,
        param: String,
        message: String,
    },
}

/// What a handler gets to look at
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Dot path of the field under validation
    pub field: &'a str,
    /// Its value in the merged input (`None` when absent)
    pub value: Option<&'a Value>,
    /// Text after the `:` of the rule
    pub param: Option<&'a str>,
    /// Merged input
    pub data: &'a Value,
    /// The raw request, for handlers that need the caller identity
    pub request: &'a RequestData,
}

/// A named custom rule
#[async_trait]
pub trait RuleHandler: Send + Sync {
    async fn check(&self, input: RuleInput<'_>) -> Result<Option<String>>;
}

/// Adapter for synchronous closures
pub struct FnRule<F>(pub F);

#[async_trait]
impl<F> RuleHandler for FnRule<F>
where
    F: Fn(&RuleInput<'_>) -> Option<String> + Send + Sync,
{
    async fn check(&self, input: RuleInput<'_>) -> Result<Option<String>> {
        Ok((self.0)(&input))
    }
}

/// Placeholder for uniqueness checks; forms with a backing store register
/// their own `unique` handler
struct AlwaysUnique;

#[async_trait]
impl RuleHandler for AlwaysUnique {
    async fn check(&self, _input: RuleInput<'_>) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Name → handler lookup for custom rules
#[derive(Clone)]
pub struct RuleRegistry {
    handlers: HashMap<String, Arc<dyn RuleHandler>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut handlers: HashMap<String, Arc<dyn RuleHandler>> = HashMap::new();
        handlers.insert("unique".to_string(), Arc::new(AlwaysUnique));
        Self { handlers }
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

impl RuleRegistry {
    /// Registry with the default `unique` hook
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no handlers at all
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `name` (case-insensitive)
    ///
    /// Built-in rules are evaluated first, so a handler named after one is
    /// never reached.
    pub fn register(mut self, name: &str, handler: impl RuleHandler + 'static) -> Self {
        let name = name.trim().to_lowercase();
        if BUILTIN_RULES.contains(&name.as_str()) {
            tracing::warn!(rule = %name, "custom rule is shadowed by a built-in rule");
        }
        self.handlers.insert(name, Arc::new(handler));
        self
    }

    /// Register a synchronous closure
    pub fn register_fn<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.register(name, FnRule(f))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RuleHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
