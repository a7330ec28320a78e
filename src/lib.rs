//! # crudrest
//!
//! Generic CRUD persistence services exposed as REST resources on Axum.
//!
//! - [`service::CrudService`]: find, count, save and delete against a
//!   Sea-ORM database ([`DatabaseService`]) or an in-memory map ([`InMemoryService`])
//! - [`filtering`]: the query-parameter predicate grammar (`<`, `>`, `~`, `...Id`)
//! - [`resource`]: the HTTP state machine and [`router`]
//! - [`errors`]: translation of service failures into status codes and payloads
//!
//! ```rust,ignore
//! use crudrest::{CrudOptions, DatabaseService, SimpleResource, normalized, router};
//!
//! let widgets = SimpleResource::new(
//!     "widget",
//!     Arc::new(DatabaseService::<Widget>::new(db)),
//!     CrudOptions::from_env(),
//! );
//! let app = normalized(Router::new().nest("/api/widgets", router(Arc::new(widgets))));
//! ```

pub mod core;
pub mod cors;
pub mod errors;
pub mod filtering;
pub mod options;
pub mod resource;
pub mod service;
pub mod validation;

pub use self::core::{CrudIdentifiable, EntityId};
pub use errors::{ApiError, ErrorPayload, ErrorTranslator};
pub use filtering::{FilterError, FilterSet, QueryPredicate};
pub use options::CrudOptions;
pub use resource::{CrudResource, SimpleResource, normalized, router};
pub use service::{
    CrudService, DatabaseService, InMemoryService, PersistentEntity, ServiceError, ServiceErrorKind,
};
pub use validation::{ConstraintViolation, Validatable, ValidationErrors};
