//! Form request declarations
//!
//! A form request bundles everything needed to accept one kind of input:
//! who may send it, the rules per field, custom messages, custom rule
//! handlers and a final transformation of the validated data.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::data::RequestData;
use super::messages::Messages;
use super::registry::RuleRegistry;
use super::rules::RuleSet;
use crate::core::auth::AuthPolicy;

/// Declarative description of a validated request
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct RegisterUser;
///
/// #[async_trait]
/// impl FormRequest for RegisterUser {
///     fn rules(&self) -> RuleSet {
///         RuleSet::new()
///             .field("name", "required|string|max:255")
///             .field("email", "required|email|unique:users,email")
///             .field("password", "required|min:8|confirmed")
///             .field("role", "required|in:CUSTOMER,PROVIDER")
///     }
/// }
/// ```
#[async_trait]
pub trait FormRequest: Send + Sync {
    /// Rules per field, evaluated in declaration order
    fn rules(&self) -> RuleSet;

    /// Custom messages keyed by `field.rule`
    fn messages(&self) -> Messages {
        Messages::new()
    }

    /// Policy checked by the default [`authorize`](FormRequest::authorize)
    fn policy(&self) -> AuthPolicy {
        AuthPolicy::Public
    }

    /// Whether the caller may submit this form
    ///
    /// `Ok(false)` rejects with 403; `Err` is an internal fault.
    async fn authorize(&self, request: &RequestData) -> Result<bool> {
        Ok(self.policy().check(&request.auth))
    }

    /// Handlers for rules that are not built in
    fn registry(&self) -> RuleRegistry {
        RuleRegistry::default()
    }

    /// Last step applied to the validated data
    fn transform(&self, validated: Value) -> Result<Value> {
        Ok(validated)
    }
}
