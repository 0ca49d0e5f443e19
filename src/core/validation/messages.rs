//! Error message templates
//!
//! Templates use `:field`, `:min`, `:max`, `:values` and `:other`
//! placeholders. A form can override the message of any `field.rule` pair
//! through [`Messages`]; overrides go through the same placeholder
//! substitution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::validators::Failure;

/// Language of the default messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-BR")]
    PtBr,
}

/// Custom messages keyed by `"<field>.<rule>"`
///
/// ```rust,ignore
/// Messages::new()
///     .set("email.required", "We need your email")
///     .set("password.min", "Use at least :min characters")
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages(HashMap<String, String>);

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.insert(key.into(), message.into());
        self
    }

    /// Override for `field.rule`, if any
    pub fn get(&self, field: &str, rule: &str) -> Option<&str> {
        self.0.get(&format!("{}.{}", field, rule)).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Messages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Default template of a built-in failure
pub fn template(locale: Locale, failure: &Failure) -> &'static str {
    match locale {
        Locale::En => match failure {
            Failure::Required => "The :field field is required",
            Failure::String => "The :field field must be a string",
            Failure::Email => "The :field field must be a valid email address",
            Failure::Min { array: false, .. } => {
                "The :field field must be at least :min characters"
            }
            Failure::Min { array: true, .. } => "The :field field must have at least :min items",
            Failure::Max { array: false, .. } => {
                "The :field field may not be greater than :max characters"
            }
            Failure::Max { array: true, .. } => "The :field field may not have more than :max items",
            Failure::Numeric => "The :field field must be a number",
            Failure::Integer => "The :field field must be an integer",
            Failure::In { .. } => "The :field field must be one of: :values",
            Failure::Confirmed => "The :field confirmation does not match",
            Failure::Array => "The :field field must be an array",
            Failure::Boolean => "The :field field must be true or false",
            Failure::Date => "The :field field must be a valid date",
            Failure::Url => "The :field field must be a valid URL",
            Failure::Regex => "The :field field format is invalid",
        },
        Locale::PtBr => match failure {
            Failure::Required => "O campo :field é obrigatório",
            Failure::String => "O campo :field deve ser uma string",
            Failure::Email => "O campo :field deve ser um email válido",
            Failure::Min { array: false, .. } => {
                "O campo :field deve ter pelo menos :min caracteres"
            }
            Failure::Min { array: true, .. } => "O campo :field deve ter pelo menos :min itens",
            Failure::Max { array: false, .. } => "O campo :field deve ter no máximo :max caracteres",
            Failure::Max { array: true, .. } => "O campo :field deve ter no máximo :max itens",
            Failure::Numeric => "O campo :field deve ser um número",
            Failure::Integer => "O campo :field deve ser um número inteiro",
            Failure::In { .. } => "O campo :field deve ser um dos valores: :values",
            Failure::Confirmed => "A confirmação do campo :field não confere",
            Failure::Array => "O campo :field deve ser um array",
            Failure::Boolean => "O campo :field deve ser um valor booleano",
            Failure::Date => "O campo :field deve ser uma data válida",
            Failure::Url => "O campo :field deve ser uma URL válida",
            Failure::Regex => "O campo :field tem formato inválido",
        },
    }
}

/// Substitute placeholders of `template` for `field` failing with `failure`
pub fn render(template: &str, field: &str, failure: Option<&Failure>) -> String {
    let mut message = template.replace(":field", field);
    match failure {
        Some(Failure::Min { min, .. }) => message = message.replace(":min", &min.to_string()),
        Some(Failure::Max { max, .. }) => message = message.replace(":max", &max.to_string()),
        Some(Failure::In { values }) => message = message.replace(":values", &values.join(", ")),
        Some(Failure::Confirmed) => {
            message = message.replace(":other", &format!("{}_confirmation", field))
        }
        _ => {}
    }
    message
}

/// Final message for a built-in failure: the override if declared, else the
/// locale default
pub fn message_for(locale: Locale, messages: &Messages, field: &str, failure: &Failure) -> String {
    let template = messages
        .get(field, failure.rule_name())
        .unwrap_or_else(|| template(locale, failure));
    render(template, field, Some(failure))
}
