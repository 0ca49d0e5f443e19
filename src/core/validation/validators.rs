//! Built-in rule checks
//!
//! "Present" means not absent and not `null`; "filled" means present and
//! not an empty string. Format rules only look at filled values so that
//! optional fields stay optional unless `required` is declared. `string`,
//! `array` and `boolean` skip only absent fields: an explicit `null` is not
//! of those types.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use validator::ValidateUrl;

use super::data::get_path;
use super::registry::RuleError;
use super::rules::Rule;

/// Names handled by [`check`]
pub const BUILTIN_RULES: &[&str] = &[
    "required", "string", "email", "min", "max", "numeric", "integer", "in", "confirmed", "array",
    "boolean", "date", "url", "regex",
];

/// Why a built-in rule failed; carries what the message template needs
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Required,
    String,
    Email,
    Min { min: usize, array: bool },
    Max { max: usize, array: bool },
    Numeric,
    Integer,
    In { values: Vec<String> },
    Confirmed,
    Array,
    Boolean,
    Date,
    Url,
    Regex,
}

impl Failure {
    /// Rule name this failure belongs to (used for `field.rule` messages)
    pub fn rule_name(&self) -> &'static str {
        match self {
            Failure::Required => "required",
            Failure::String => "string",
            Failure::Email => "email",
            Failure::Min { .. } => "min",
            Failure::Max { .. } => "max",
            Failure::Numeric => "numeric",
            Failure::Integer => "integer",
            Failure::In { .. } => "in",
            Failure::Confirmed => "confirmed",
            Failure::Array => "array",
            Failure::Boolean => "boolean",
            Failure::Date => "date",
            Failure::Url => "url",
            Failure::Regex => "regex",
        }
    }
}

/// Outcome of one built-in rule
pub type CheckResult = Result<Option<Failure>, RuleError>;

/// Run a built-in rule; `None` when `rule` is not a built-in
///
/// `data` is the merged request input, used by `confirmed` to find the
/// sibling `<field>_confirmation`.
pub fn check(rule: &Rule, field: &str, value: Option<&Value>, data: &Value) -> Option<CheckResult> {
    let fail_if = |failed: bool, failure: Failure| Ok(failed.then_some(failure));

    let result = match rule.name() {
        "required" => fail_if(!required(value), Failure::Required),
        "string" => fail_if(value.is_some() && !is_string(value), Failure::String),
        "email" => fail_if(filled(value) && !email(value), Failure::Email),
        "min" => {
            let min = match usize_param(rule, field) {
                Ok(min) => min,
                Err(e) => return Some(Err(e)),
            };
            let too_short = length(value).is_some_and(|len| len < min);
            fail_if(
                too_short,
                Failure::Min {
                    min,
                    array: value.is_some_and(Value::is_array),
                },
            )
        }
        "max" => {
            let max = match usize_param(rule, field) {
                Ok(max) => max,
                Err(e) => return Some(Err(e)),
            };
            let too_long = length(value).is_some_and(|len| len > max);
            fail_if(
                too_long,
                Failure::Max {
                    max,
                    array: value.is_some_and(Value::is_array),
                },
            )
        }
        "numeric" => fail_if(checkable_number(value) && !numeric(value), Failure::Numeric),
        "integer" => fail_if(checkable_number(value) && !integer(value), Failure::Integer),
        "in" => {
            let values = match list_param(rule, field) {
                Ok(values) => values,
                Err(e) => return Some(Err(e)),
            };
            let allowed = as_text(value).is_some_and(|text| values.contains(&text));
            fail_if(filled(value) && !allowed, Failure::In { values })
        }
        "confirmed" => {
            let confirmation = get_path(data, &format!("{}_confirmation", field));
            fail_if(value != confirmation, Failure::Confirmed)
        }
        "array" => fail_if(value.is_some() && !value.is_some_and(Value::is_array), Failure::Array),
        "boolean" => fail_if(value.is_some() && !boolean(value), Failure::Boolean),
        "date" => fail_if(filled(value) && !date(value), Failure::Date),
        "url" => fail_if(filled(value) && !url(value), Failure::Url),
        "regex" => {
            let pattern = match regex_param(rule, field) {
                Ok(pattern) => pattern,
                Err(e) => return Some(Err(e)),
            };
            let matches = as_text(value).is_some_and(|text| pattern.is_match(&text));
            fail_if(filled(value) && !matches, Failure::Regex)
        }
        _ => return None,
    };

    Some(result)
}

// =============================================================================
// Presence helpers
// =============================================================================

fn present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

fn filled(value: Option<&Value>) -> bool {
    present(value) && value.and_then(Value::as_str) != Some("")
}

/// Numeric rules skip absent, null and exactly-empty strings
fn checkable_number(value: Option<&Value>) -> bool {
    filled(value)
}

/// Length of strings (in chars) and arrays; other types have none
fn length(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Scalar as text, the way it would appear in a form post
fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
// Checks
// =============================================================================

/// Fails on absent, null, `""` and `[]`
pub fn required(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

pub fn is_string(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_string)
}

/// `local@domain.tld` shape
pub fn email(value: Option<&Value>) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    });
    value
        .and_then(Value::as_str)
        .is_some_and(|s| regex.is_match(s))
}

/// Blank strings read as zero; `inf`, `NaN` and friends are not numbers
fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JSON numbers and numeric strings
pub fn numeric(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(_)) => true,
        Some(Value::String(s)) => parse_number(s).is_some(),
        _ => false,
    }
}

/// Whole numbers, as JSON numbers or strings
pub fn integer(value: Option<&Value>) -> bool {
    let number = match value {
        Some(Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return true;
            }
            n.as_f64()
        }
        Some(Value::String(s)) => parse_number(s),
        _ => None,
    };
    number.is_some_and(|n| n.is_finite() && n.fract() == 0.0)
}

/// `true`, `false`, `1`, `0` as JSON values or strings
pub fn boolean(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(_)) => true,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n == 0.0 || n == 1.0),
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "false" | "1" | "0"),
        _ => false,
    }
}

/// RFC 3339, RFC 2822 and the common ISO-like layouts
pub fn date(value: Option<&Value>) -> bool {
    let Some(s) = value.and_then(Value::as_str).map(str::trim) else {
        return false;
    };
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// Absolute URL
pub fn url(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.to_string().validate_url())
}

// =============================================================================
// Parameters
// =============================================================================

fn required_param<'a>(rule: &'a Rule, field: &str) -> Result<&'a str, RuleError> {
    match rule.param() {
        Some(param) if !param.trim().is_empty() => Ok(param),
        _ => Err(RuleError::MissingParameter {
            field: field.to_string(),
            rule: rule.name().to_string(),
        }),
    }
}

fn usize_param(rule: &Rule, field: &str) -> Result<usize, RuleError> {
    let param = required_param(rule, field)?;
    param
        .trim()
        .parse::<usize>()
        .map_err(|e| RuleError::InvalidParameter {
            field: field.to_string(),
            rule: rule.name().to_string(),
            param: param.to_string(),
            message: e.to_string(),
        })
}

fn list_param(rule: &Rule, field: &str) -> Result<Vec<String>, RuleError> {
    let param = required_param(rule, field)?;
    Ok(param.split(',').map(|v| v.trim().to_string()).collect())
}

fn regex_param(rule: &Rule, field: &str) -> Result<Regex, RuleError> {
    let param = required_param(rule, field)?;
    Regex::new(param).map_err(|e| RuleError::InvalidParameter {
        field: field.to_string(),
        rule: rule.name().to_string(),
        param: param.to_string(),
        message: e.to_string(),
    })
}
