//! Caller identity and authorization policies
//!
//! An authentication layer in front of the router resolves the caller and
//! stores an [`AuthContext`] in the request extensions; form requests read
//! it back through [`RequestData`](crate::core::validation::RequestData).

use axum::http::Extensions;

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: i64, roles: Vec<String> },

    /// Service-to-service communication
    Service { service_name: String },

    /// Marketplace administrator
    Admin { admin_id: i64 },

    /// No authentication (public access)
    #[default]
    Anonymous,
}

impl AuthContext {
    /// Context stored by the authentication layer, or `Anonymous`
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<AuthContext>().cloned().unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthContext::Anonymous)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    pub fn is_service(&self) -> bool {
        matches!(self, AuthContext::Service { .. })
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<i64> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        match self {
            AuthContext::User { roles, .. } => roles.iter().any(|r| r == role),
            _ => false,
        }
    }
}

/// Authorization policy for a form request
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated caller
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<String>),

    /// Service-to-service only
    ServiceOnly,

    /// Admin only
    AdminOnly,

    /// Combination of policies (AND)
    And(Vec<AuthPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AuthPolicy>),

    /// Custom policy function
    Custom(fn(&AuthContext) -> bool),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,

            AuthPolicy::Authenticated => context.is_authenticated(),

            AuthPolicy::HasRole(required) => required.iter().any(|r| context.has_role(r)),

            AuthPolicy::ServiceOnly => context.is_service(),

            AuthPolicy::AdminOnly => context.is_admin(),

            AuthPolicy::And(policies) => policies.iter().all(|p| p.check(context)),

            AuthPolicy::Or(policies) => policies.iter().any(|p| p.check(context)),

            AuthPolicy::Custom(f) => f(context),
        }
    }
}
