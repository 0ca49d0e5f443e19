//! Core module containing fundamental traits and types

pub mod auth;
pub mod error;
pub mod query;
pub mod repository;
pub mod store;
pub mod validation;

pub use auth::{AuthContext, AuthPolicy};
pub use error::{BazaarError, BazaarResult};
pub use query::{ListResult, PageQuery, Paginated, PaginationMeta, Paging};
pub use repository::Repository;
pub use store::{CollectionStore, Count, FindMany, OrderBy, SortDirection};
