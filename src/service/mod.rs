//! # Persistence Services
//!
//! [`CrudService`] is the generic CRUD contract over an entity type. Two
//! backends implement it:
//!
//! - [`DatabaseService`]: Sea-ORM backed, every mutating call runs in its own
//!   transaction
//! - [`InMemoryService`]: an ordered map with a counter-based id sequence, for
//!   tests and prototypes; it has no query engine, so non-empty filter sets
//!   are answered with [`ServiceError::UnsupportedFilter`]
//!
//! Resources only talk to `dyn CrudService<T>`, so switching from the
//! in-memory backend to a database needs no resource changes.

pub mod database;
pub mod memory;

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::core::{CrudIdentifiable, EntityId};
use crate::filtering::{FilterError, FilterSet};
use crate::validation::ValidationErrors;

pub use database::{DatabaseService, PersistentEntity};
pub use memory::InMemoryService;

/// Failures surfaced by a [`CrudService`]
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The entity broke one or more declared constraints; nothing reached storage
    #[error(transparent)]
    ValidationFailed(#[from] ValidationErrors),

    /// Storage rejected the write because of a uniqueness or foreign-key constraint
    #[error("{exception}: {message}")]
    IntegrityViolation { exception: String, message: String },

    /// The backend cannot evaluate filter predicates
    #[error("filtering is not supported by this service")]
    UnsupportedFilter,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("database error: {0}")]
    Database(DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`ServiceError`], used to register exception mappers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    ValidationFailed,
    IntegrityViolation,
    UnsupportedFilter,
    Filter,
    Database,
    Internal,
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::ValidationFailed(_) => ServiceErrorKind::ValidationFailed,
            Self::IntegrityViolation { .. } => ServiceErrorKind::IntegrityViolation,
            Self::UnsupportedFilter => ServiceErrorKind::UnsupportedFilter,
            Self::Filter(_) => ServiceErrorKind::Filter,
            Self::Database(_) => ServiceErrorKind::Database,
            Self::Internal(_) => ServiceErrorKind::Internal,
        }
    }
}

/// Storage constraint violations become [`ServiceError::IntegrityViolation`]
/// right here; every other `DbErr` stays opaque.
impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::IntegrityViolation {
                exception: "UniqueConstraintViolation".to_string(),
                message,
            },
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => Self::IntegrityViolation {
                exception: "ForeignKeyConstraintViolation".to_string(),
                message,
            },
            _ => Self::Database(err),
        }
    }
}

/// Generic CRUD operations against a storage backend.
///
/// `find_all`, `count_all` and `delete_all` are the filtered variants called
/// with an empty filter set unless a backend overrides them.
#[async_trait]
pub trait CrudService<T: CrudIdentifiable>: Send + Sync {
    /// Single lookup by id
    async fn find_by_id(&self, id: EntityId) -> Result<Option<T>, ServiceError>;

    async fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        self.find_by(&FilterSet::new()).await
    }

    /// All entities matching every filter; order is unspecified
    async fn find_by(&self, filters: &FilterSet) -> Result<Vec<T>, ServiceError>;

    async fn count_all(&self) -> Result<u64, ServiceError> {
        self.count_by(&FilterSet::new()).await
    }

    async fn count_by(&self, filters: &FilterSet) -> Result<u64, ServiceError>;

    /// Insert when the id is absent, otherwise update or replace the record
    /// with that id.
    ///
    /// Callers must continue with the returned entity: it carries the
    /// assigned id and whatever the backend normalized.
    async fn save(&self, entity: T) -> Result<T, ServiceError>;

    /// Remove the record; an unknown id is not an error
    async fn delete(&self, id: EntityId) -> Result<(), ServiceError>;

    async fn delete_all(&self) -> Result<(), ServiceError> {
        self.delete_by(&FilterSet::new()).await
    }

    async fn delete_by(&self, filters: &FilterSet) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ConstraintViolation;

    #[test]
    fn test_kind_matches_variant() {
        let validation: ServiceError =
            ValidationErrors::from(ConstraintViolation::new("name", "x", "y")).into();
        assert_eq!(validation.kind(), ServiceErrorKind::ValidationFailed);
        assert_eq!(ServiceError::UnsupportedFilter.kind(), ServiceErrorKind::UnsupportedFilter);
        assert_eq!(
            ServiceError::Internal("boom".to_string()).kind(),
            ServiceErrorKind::Internal
        );
    }

    #[test]
    fn test_plain_db_errors_stay_opaque() {
        let err: ServiceError = DbErr::Custom("connection reset".to_string()).into();
        assert_eq!(err.kind(), ServiceErrorKind::Database);
        assert!(err.to_string().starts_with("database error: "));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_filter_error_conversion() {
        let err: ServiceError = FilterError::UnknownField {
            field: "nope".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ServiceErrorKind::Filter);
        assert_eq!(err.to_string(), "field 'nope' cannot be filtered");
    }
}
