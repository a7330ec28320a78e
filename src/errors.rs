//! # Error Handling for CRUD Resources
//!
//! Failures are translated exactly once, at the boundary between a resource
//! and its persistence service:
//!
//! | Failure | Status | Body |
//! |---|---|---|
//! | entity not found | 404 | empty |
//! | body id present on create / not matching the path on update | 400 | `error` payload |
//! | malformed filter parameter | 400 | `error` payload |
//! | declared constraint violated | 400 | `validationErrors` payload |
//! | count / delete-all switched off | 403 | empty |
//! | storage integrity violation, detail exposure on | 400 | `error` payload |
//! | anything else | mapper result, or 500 | empty |
//!
//! Internal details of 500 responses are logged with `tracing` and never sent
//! to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::EntityId;
use crate::filtering::FilterError;
use crate::options::CrudOptions;
use crate::service::{ServiceError, ServiceErrorKind};
use crate::validation::{ConstraintViolation, ValidationErrors};

/// Message sent when a create request already carries an id.
pub const BODY_ID_NOT_NULL_MESSAGE: &str = "Request body entity's id field is expected to be null.";

/// Message sent when an update request's body id differs from the path id.
pub const BODY_ID_MISMATCH_MESSAGE: &str =
    "Request body entity's id field is expected to be empty or to match the id path parameter.";

/// Constraint attributes that are never reported
const RESERVED_ATTRIBUTES: [&str; 3] = ["groups", "message", "payload"];

/// Name and message of a single failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetail {
    pub exception: String,
    pub detail_message: String,
}

/// One violated field, ready for client-side message lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViolationInfo {
    pub message_template: String,
    pub invalid_value: Option<String>,
    pub constraint_class_name: String,
    pub attributes: BTreeMap<String, String>,
}

impl From<&ConstraintViolation> for ViolationInfo {
    fn from(violation: &ConstraintViolation) -> Self {
        Self {
            message_template: violation.message_key().to_string(),
            invalid_value: violation.invalid_value.clone(),
            constraint_class_name: violation.constraint.clone(),
            attributes: violation
                .attributes
                .iter()
                .filter(|(key, _)| !RESERVED_ATTRIBUTES.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Body of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// `{"error": {"exception": ..., "detailMessage": ...}}`
    Error { error: ExceptionDetail },
    /// `{"validationErrors": {"<field>": {...}}}`
    Validation {
        #[serde(rename = "validationErrors")]
        validation_errors: BTreeMap<String, ViolationInfo>,
    },
}

impl ErrorPayload {
    #[must_use]
    pub fn exception(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            error: ExceptionDetail {
                exception: exception.into(),
                detail_message: message.into(),
            },
        }
    }

    /// One entry per violated field; a later violation of the same field
    /// replaces an earlier one.
    #[must_use]
    pub fn validation(errors: &ValidationErrors) -> Self {
        let validation_errors = errors
            .violations()
            .iter()
            .map(|violation| (violation.property_name().to_string(), ViolationInfo::from(violation)))
            .collect();
        Self::Validation { validation_errors }
    }
}

/// HTTP-facing error of a resource request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404 Not Found, empty body
    #[error("{resource} with ID '{id}' not found")]
    NotFound { resource: String, id: EntityId },

    /// 400 Bad Request with an `error` payload
    #[error("bad request: {payload:?}")]
    BadRequest { payload: ErrorPayload },

    /// 400 Bad Request with a `validationErrors` payload
    #[error("validation failed: {payload:?}")]
    ValidationFailed { payload: ErrorPayload },

    /// 403 Forbidden, empty body
    #[error("{feature} is disabled")]
    Forbidden { feature: &'static str },

    /// 500 Internal Server Error, empty body; details are logged only
    #[error("internal server error")]
    Internal { internal: Option<String> },

    /// Response chosen by a registered exception mapper
    #[error("{status}")]
    Custom {
        status: StatusCode,
        body: Option<serde_json::Value>,
        internal: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: EntityId) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Request-shape error, rejected before the service is called
    pub fn malformed_body(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            payload: ErrorPayload::exception(exception, message),
        }
    }

    #[must_use]
    pub fn validation_failed(errors: &ValidationErrors) -> Self {
        Self::ValidationFailed {
            payload: ErrorPayload::validation(errors),
        }
    }

    #[must_use]
    pub const fn forbidden(feature: &'static str) -> Self {
        Self::Forbidden { feature }
    }

    pub fn internal(internal: impl Into<String>) -> Self {
        Self::Internal {
            internal: Some(internal.into()),
        }
    }

    pub fn custom(
        status: StatusCode,
        body: Option<serde_json::Value>,
        internal: Option<String>,
    ) -> Self {
        Self::Custom {
            status,
            body,
            internal,
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } | Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Custom { status, .. } => *status,
        }
    }

    /// Payload sent to the client, if any
    #[must_use]
    pub const fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::BadRequest { payload } | Self::ValidationFailed { payload } => Some(payload),
            _ => None,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Internal {
                internal: Some(details),
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::Custom {
                internal: Some(details),
                status,
                ..
            } => {
                tracing::error!(status = %status, details = %details, "Mapped error occurred");
            }
            _ => {
                tracing::debug!(error = %self, status = %self.status_code(), "API error");
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        match self {
            Self::BadRequest { payload } | Self::ValidationFailed { payload } => {
                (status, Json(payload)).into_response()
            }
            Self::Custom {
                body: Some(body), ..
            } => (status, Json(body)).into_response(),
            _ => status.into_response(),
        }
    }
}

fn filter_exception_name(err: &FilterError) -> &'static str {
    match err {
        FilterError::MalformedFilterValue { .. } => "MalformedFilterValue",
        FilterError::UnknownField { .. } => "UnknownField",
    }
}

/// Fallback translation for one kind of service failure
pub type ExceptionMapper = Arc<dyn Fn(&ServiceError) -> ApiError + Send + Sync>;

/// Converts service failures into HTTP errors.
#[derive(Clone, Default)]
pub struct ErrorTranslator {
    expose_exception_detail: bool,
    mappers: HashMap<ServiceErrorKind, ExceptionMapper>,
}

impl ErrorTranslator {
    #[must_use]
    pub fn new(expose_exception_detail: bool) -> Self {
        Self {
            expose_exception_detail,
            mappers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_options(options: &CrudOptions) -> Self {
        Self::new(options.expose_exception_detail)
    }

    /// Register the mapper used for failures of `kind` that no built-in rule handles.
    #[must_use]
    pub fn with_mapper<F>(mut self, kind: ServiceErrorKind, mapper: F) -> Self
    where
        F: Fn(&ServiceError) -> ApiError + Send + Sync + 'static,
    {
        self.mappers.insert(kind, Arc::new(mapper));
        self
    }

    #[must_use]
    pub fn translate(&self, err: ServiceError) -> ApiError {
        match &err {
            ServiceError::ValidationFailed(errors) => ApiError::validation_failed(errors),
            ServiceError::Filter(filter_err) => {
                ApiError::malformed_body(filter_exception_name(filter_err), filter_err.to_string())
            }
            ServiceError::IntegrityViolation { exception, message }
                if self.expose_exception_detail =>
            {
                ApiError::BadRequest {
                    payload: ErrorPayload::exception(exception.clone(), message.clone()),
                }
            }
            _ => match self.mappers.get(&err.kind()) {
                Some(mapper) => mapper(&err),
                None => ApiError::internal(err.to_string()),
            },
        }
    }
}

impl fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTranslator")
            .field("expose_exception_detail", &self.expose_exception_detail)
            .field("mappers", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}
