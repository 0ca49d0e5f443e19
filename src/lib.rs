//! # Bazaar
//!
//! Request-driven pagination and declarative form validation for marketplace
//! REST APIs built on axum.
//!
//! ## Features
//!
//! - **Paginated repositories**: turn `?page=&limit=` into a store query plus
//!   a count, and return `{ items, total, page, limit, lastPage }`
//! - **Form requests**: authorize and validate request input with
//!   pipe-delimited rules (`"required|email"`), nested dot paths and custom
//!   rule handlers
//! - **Consistent errors**: 403, 422 and 500 bodies with a single shape
//! - **Configuration-Based**: page sizes, message locale and unknown-rule
//!   policy from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bazaar::prelude::*;
//!
//! #[derive(Default)]
//! struct CreateService;
//!
//! #[async_trait]
//! impl FormRequest for CreateService {
//!     fn policy(&self) -> AuthPolicy {
//!         AuthPolicy::HasRole(vec!["PROVIDER".into()])
//!     }
//!
//!     fn rules(&self) -> RuleSet {
//!         RuleSet::new()
//!             .field("title", "required|string|max:120")
//!             .field("price", "required|numeric")
//!     }
//! }
//!
//! async fn list_services(
//!     State(repo): State<Repository<InMemoryStore>>,
//!     Query(query): Query<PageQuery>,
//! ) -> BazaarResult<ListResult<Value>> {
//!     Ok(repo.paginate_from_query(&query).find_all(query.to_find_many()).await?)
//! }
//!
//! async fn create_service(
//!     State(repo): State<Repository<InMemoryStore>>,
//!     Validated(data, _): Validated<CreateService>,
//! ) -> BazaarResult<Json<Value>> {
//!     Ok(Json(repo.create(data).await?))
//! }
//! ```

pub mod config;
pub mod core;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Pagination ===
    pub use crate::core::{
        query::{ListResult, PageQuery, Paginated, PaginationMeta, Paging},
        repository::Repository,
        store::{CollectionStore, Count, FindMany, OrderBy, SortDirection},
    };

    // === Validation ===
    pub use crate::core::validation::{
        FormRequest, Locale, Messages, RequestData, RuleInput, RuleRegistry, RuleSet, Validated,
        ValidatedData, ValidationErrors, ValidationFailure, ValidationPipeline, validate,
    };

    // === Auth & Errors ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy},
        error::{BazaarError, BazaarResult},
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryStore;

    // === Config ===
    pub use crate::config::{BazaarConfig, PaginationConfig, UnknownRulePolicy, ValidationConfig};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        routing::{delete, get, post, put},
    };
}
