//! Form request evaluation
//!
//! `Start → Authorizing → {Forbidden | RuleEvaluation}`, then
//! `RuleEvaluation → {Invalid | Transforming → Success}`. Any error raised by
//! a hook, a rule configuration error or a panic inside a hook ends in
//! [`ValidationFailure::Internal`] and no data is returned.

use anyhow::anyhow;
use axum::Json;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use super::data::{RequestData, extract_paths, get_path};
use super::form::FormRequest;
use super::messages::{Messages, message_for, render};
use super::registry::{RuleError, RuleInput, RuleRegistry};
use super::rules::Rule;
use super::validators;
use crate::config::{UnknownRulePolicy, ValidationConfig};
use crate::core::error::{BazaarError, ValidationError};

/// Field path → messages, in rule declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message of a field
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of failing fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a form request was not accepted
#[derive(Debug)]
pub enum ValidationFailure {
    /// `authorize` returned false
    Forbidden,
    /// At least one field failed its rules
    Invalid(ValidationErrors),
    /// A hook failed, panicked or a rule was misconfigured
    Internal(anyhow::Error),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::Forbidden => write!(f, "request is not authorized"),
            ValidationFailure::Invalid(errors) => {
                write!(f, "{} field(s) failed validation", errors.len())
            }
            ValidationFailure::Internal(e) => write!(f, "validation fault: {:#}", e),
        }
    }
}

impl std::error::Error for ValidationFailure {}

impl From<ValidationFailure> for BazaarError {
    fn from(failure: ValidationFailure) -> Self {
        match failure {
            ValidationFailure::Forbidden => BazaarError::forbidden(),
            ValidationFailure::Invalid(errors) => {
                BazaarError::Validation(ValidationError::FieldErrors(errors))
            }
            ValidationFailure::Internal(e) => BazaarError::Internal(format!("{:#}", e)),
        }
    }
}

/// Internal faults are already logged by [`ValidationPipeline::run`], so this
/// renders the body without logging again
impl IntoResponse for ValidationFailure {
    fn into_response(self) -> Response {
        let error = BazaarError::from(self);
        (error.status_code(), Json(error.to_response())).into_response()
    }
}

/// Runs [`FormRequest`]s against request input
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPipeline {
    config: ValidationConfig,
}

impl ValidationPipeline {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ValidationConfig {
        self.config
    }

    /// Authorize, validate and extract the declared fields of `request`
    pub async fn run<F>(&self, form: &F, request: &RequestData) -> Result<Value, ValidationFailure>
    where
        F: FormRequest + ?Sized,
    {
        let outcome = AssertUnwindSafe(self.evaluate(form, request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Err(ValidationFailure::Internal(cause))) => {
                tracing::error!(error = %format!("{:#}", cause), "form request failed");
                Err(ValidationFailure::Internal(cause))
            }
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(panic = %message, "form request panicked");
                Err(ValidationFailure::Internal(anyhow!(
                    "panic during validation: {}",
                    message
                )))
            }
        }
    }

    async fn evaluate<F>(&self, form: &F, request: &RequestData) -> Result<Value, ValidationFailure>
    where
        F: FormRequest + ?Sized,
    {
        tracing::debug!("authorizing form request");
        let authorized = form
            .authorize(request)
            .await
            .map_err(ValidationFailure::Internal)?;
        if !authorized {
            tracing::debug!("form request forbidden");
            return Err(ValidationFailure::Forbidden);
        }

        let rules = form.rules();
        let messages = form.messages();
        let registry = form.registry();
        let data = request.merged();

        tracing::debug!(fields = rules.len(), "evaluating rules");
        let mut errors = ValidationErrors::new();
        for (field, field_rules) in rules.iter() {
            let value = get_path(&data, field);
            for rule in field_rules {
                let context = RuleContext {
                    field,
                    value,
                    data: &data,
                    request,
                    messages: &messages,
                    registry: &registry,
                };
                if let Some(message) = self.check_rule(rule, context).await? {
                    errors.add(field, message);
                    break;
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(failed = errors.len(), "form request invalid");
            return Err(ValidationFailure::Invalid(errors));
        }

        tracing::debug!("transforming validated data");
        let validated = extract_paths(&data, rules.fields());
        form.transform(validated).map_err(ValidationFailure::Internal)
    }

    /// Message of the failing rule, `None` when it passes
    async fn check_rule(
        &self,
        rule: &Rule,
        ctx: RuleContext<'_>,
    ) -> Result<Option<String>, ValidationFailure> {
        if let Some(result) = validators::check(rule, ctx.field, ctx.value, ctx.data) {
            let failure = result.map_err(|e| ValidationFailure::Internal(e.into()))?;
            return Ok(failure.map(|f| message_for(self.config.locale, ctx.messages, ctx.field, &f)));
        }

        if let Some(handler) = ctx.registry.get(rule.name()) {
            let input = RuleInput {
                field: ctx.field,
                value: ctx.value,
                param: rule.param(),
                data: ctx.data,
                request: ctx.request,
            };
            let failed = handler
                .check(input)
                .await
                .map_err(ValidationFailure::Internal)?;
            return Ok(failed.map(|message| {
                match ctx.messages.get(ctx.field, rule.name()) {
                    Some(custom) => render(custom, ctx.field, None),
                    None => message,
                }
            }));
        }

        match self.config.unknown_rules {
            UnknownRulePolicy::Reject => Err(ValidationFailure::Internal(
                RuleError::UnknownRule {
                    field: ctx.field.to_string(),
                    rule: rule.name().to_string(),
                }
                .into(),
            )),
            UnknownRulePolicy::Ignore => {
                tracing::warn!(field = ctx.field, rule = rule.name(), "ignoring unknown rule");
                Ok(None)
            }
        }
    }
}

#[derive(Clone, Copy)]
struct RuleContext<'a> {
    field: &'a str,
    value: Option<&'a Value>,
    data: &'a Value,
    request: &'a RequestData,
    messages: &'a Messages,
    registry: &'a RuleRegistry,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
