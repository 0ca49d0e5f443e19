//! Rule declarations
//!
//! A [`RuleSet`] maps field paths to ordered rule lists. Rules are written
//! either pipe-delimited (`"required|min:8"`) or as a list
//! (`["required", "regex:^(a|b)$"]`); the list form never splits on `|`,
//! which is what patterns containing a pipe need.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One rule: a lowercase name and an optional parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    name: String,
    param: Option<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, param: Option<&str>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            param: param.map(str::to_string),
        }
    }

    /// Parse `name` or `name:param`; everything after the first `:` is the
    /// parameter. Blank specs yield `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        Some(match spec.split_once(':') {
            Some((name, param)) => Self::new(name, Some(param)),
            None => Self::new(spec, None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{}:{}", self.name, param),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Anything that can be turned into an ordered rule list
pub trait IntoRules {
    fn into_rules(self) -> Vec<Rule>;
}

impl IntoRules for &str {
    fn into_rules(self) -> Vec<Rule> {
        self.split('|').filter_map(Rule::parse).collect()
    }
}

impl IntoRules for String {
    fn into_rules(self) -> Vec<Rule> {
        self.as_str().into_rules()
    }
}

impl<const N: usize> IntoRules for [&str; N] {
    fn into_rules(self) -> Vec<Rule> {
        self.into_iter().filter_map(Rule::parse).collect()
    }
}

impl IntoRules for Vec<&str> {
    fn into_rules(self) -> Vec<Rule> {
        self.into_iter().filter_map(Rule::parse).collect()
    }
}

impl IntoRules for Vec<String> {
    fn into_rules(self) -> Vec<Rule> {
        self.iter().filter_map(|s| Rule::parse(s)).collect()
    }
}

impl IntoRules for Vec<Rule> {
    fn into_rules(self) -> Vec<Rule> {
        self
    }
}

/// Ordered mapping of field path to rules
///
/// Fields are evaluated in declaration order, and so are the rules of a
/// field.
///
/// ```rust,ignore
/// let rules = RuleSet::new()
///     .field("email", "required|email")
///     .field("password", "required|min:8|confirmed")
///     .field("address.city", ["required", "string"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    fields: IndexMap<String, Vec<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the rules of a field; redeclaring a field replaces its rules
    /// but keeps its original position.
    pub fn field(mut self, path: impl Into<String>, rules: impl IntoRules) -> Self {
        self.fields.insert(path.into(), rules.into_rules());
        self
    }

    pub fn get(&self, path: &str) -> Option<&[Rule]> {
        self.fields.get(path).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRules {
    Piped(String),
    List(Vec<String>),
}

/// Rule sets can be declared in YAML/JSON:
///
/// ```yaml
/// email: required|email
/// role: [required, "in:CUSTOMER,PROVIDER"]
/// ```
impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: IndexMap<String, RawRules> = IndexMap::deserialize(deserializer)?;
        let fields = raw
            .into_iter()
            .map(|(field, rules)| {
                let rules = match rules {
                    RawRules::Piped(s) => s.into_rules(),
                    RawRules::List(list) => list.into_rules(),
                };
                (field, rules)
            })
            .collect();
        Ok(Self { fields })
    }
}

impl Serialize for RuleSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let flat: IndexMap<&str, Vec<String>> = self
            .fields
            .iter()
            .map(|(field, rules)| (field.as_str(), rules.iter().map(Rule::to_string).collect()))
            .collect();
        flat.serialize(serializer)
    }
}
