//! Form request validation
//!
//! A [`FormRequest`] declares who may send a request and which rules each
//! field must satisfy. The [`ValidationPipeline`] evaluates it against the
//! merged request input and returns only the declared fields, or a
//! [`ValidationFailure`] that renders as a 403, 422 or 500 response.

pub mod data;
pub mod extractor;
pub mod form;
pub mod messages;
pub mod pipeline;
pub mod registry;
pub mod rules;
pub mod validators;

pub use data::{RequestData, extract_paths, get_path, set_path};
pub use extractor::{Validated, ValidatedData, validate};
pub use form::FormRequest;
pub use messages::{Locale, Messages};
pub use pipeline::{ValidationErrors, ValidationFailure, ValidationPipeline};
pub use registry::{FnRule, RuleError, RuleHandler, RuleInput, RuleRegistry};
pub use rules::{IntoRules, Rule, RuleSet};
