//! # REST Resources
//!
//! A [`CrudResource`] maps HTTP verbs and paths onto a [`CrudService`]:
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/` | 200, matching entities | |
//! | GET | `/_count` | 200, number of matches | 403 when counting is off |
//! | GET | `/{id}` | 200, entity | 404 |
//! | POST | `/` | 201, saved entity, `Location` | 400 when the body has an id |
//! | PUT | `/{id}` | 200, saved entity, `Location` | 400 when the body id differs |
//! | DELETE | `/{id}` | 204 | |
//! | DELETE | `/` | 204 | 403 when delete-all is off |
//!
//! List, count and delete-all share one filter rule: with filtering enabled,
//! a request carrying query parameters uses the filtered service call, any
//! other request the unfiltered one.
//!
//! ```rust,ignore
//! let customers = SimpleResource::new(
//!     "customer",
//!     Arc::new(DatabaseService::<Customer>::new(db)),
//!     CrudOptions::from_env(),
//! );
//! let app = Router::new().nest("/api/customers", router(Arc::new(customers)));
//! ```

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{OriginalUri, Path, RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    routing::get,
};
use hyper::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

use crate::core::{CrudIdentifiable, EntityId};
use crate::cors;
use crate::errors::{ApiError, BODY_ID_MISMATCH_MESSAGE, BODY_ID_NOT_NULL_MESSAGE, ErrorTranslator};
use crate::filtering::{FilterSet, parse_query};
use crate::options::CrudOptions;
use crate::service::{CrudService, ServiceError};

/// A REST resource over one entity type.
///
/// The `*_entities_by` and `*_entity` hooks sit between the handlers and the
/// service. Override them to scope a resource, for example to always add a
/// parent filter for a nested collection; the handlers stay untouched.
#[async_trait]
pub trait CrudResource: Send + Sync + 'static {
    type Entity: CrudIdentifiable + Serialize + DeserializeOwned;

    /// Singular name used in log lines and error messages
    fn name(&self) -> &str;

    fn service(&self) -> &dyn CrudService<Self::Entity>;

    fn options(&self) -> &CrudOptions;

    fn translator(&self) -> &ErrorTranslator;

    async fn find_all_entities_by(
        &self,
        filters: Option<FilterSet>,
    ) -> Result<Vec<Self::Entity>, ServiceError> {
        match filters {
            Some(filters) => self.service().find_by(&filters).await,
            None => self.service().find_all().await,
        }
    }

    async fn find_entity_by_id(&self, id: EntityId) -> Result<Option<Self::Entity>, ServiceError> {
        self.service().find_by_id(id).await
    }

    async fn count_all_entities_by(&self, filters: Option<FilterSet>) -> Result<u64, ServiceError> {
        match filters {
            Some(filters) => self.service().count_by(&filters).await,
            None => self.service().count_all().await,
        }
    }

    async fn save_entity(&self, entity: Self::Entity) -> Result<Self::Entity, ServiceError> {
        self.service().save(entity).await
    }

    async fn delete_entity(&self, id: EntityId) -> Result<(), ServiceError> {
        self.service().delete(id).await
    }

    async fn delete_all_entities_by(&self, filters: Option<FilterSet>) -> Result<(), ServiceError> {
        match filters {
            Some(filters) => self.service().delete_by(&filters).await,
            None => self.service().delete_all().await,
        }
    }
}

/// Resource with no behaviour beyond the service it wraps.
pub struct SimpleResource<T> {
    name: String,
    service: Arc<dyn CrudService<T>>,
    options: CrudOptions,
    translator: ErrorTranslator,
}

impl<T: CrudIdentifiable> SimpleResource<T> {
    pub fn new(
        name: impl Into<String>,
        service: Arc<dyn CrudService<T>>,
        options: CrudOptions,
    ) -> Self {
        let translator = ErrorTranslator::from_options(&options);
        Self {
            name: name.into(),
            service,
            options,
            translator,
        }
    }

    /// Replace the translator, e.g. one with exception mappers registered
    #[must_use]
    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = translator;
        self
    }
}

impl<T> CrudResource for SimpleResource<T>
where
    T: CrudIdentifiable + Serialize + DeserializeOwned,
{
    type Entity = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn service(&self) -> &dyn CrudService<T> {
        self.service.as_ref()
    }

    fn options(&self) -> &CrudOptions {
        &self.options
    }

    fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }
}

/// Filter set for list, count and delete-all, or `None` for the unfiltered call
fn request_filters(options: &CrudOptions, raw_query: Option<&str>) -> Option<FilterSet> {
    if !options.allow_filters {
        return None;
    }
    let filters = parse_query(raw_query);
    if filters.is_empty() { None } else { Some(filters) }
}

/// Request path with any trailing slash and trailing numeric id segment removed.
pub fn canonical_base_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, last)) if is_id_segment(last) => parent,
        _ => trimmed,
    }
}

fn is_id_segment(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn location_headers(uri: &OriginalUri, id: Option<EntityId>) -> Result<HeaderMap, ApiError> {
    let id = id.ok_or_else(|| ApiError::internal("service returned an entity without id"))?;
    let location = format!("{}/{id}", canonical_base_path(uri.path()));
    let value = HeaderValue::from_str(&location)
        .map_err(|e| ApiError::internal(format!("invalid Location header '{location}': {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, value);
    Ok(headers)
}

pub async fn find_all<R: CrudResource>(
    State(resource): State<Arc<R>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<R::Entity>>, ApiError> {
    let filters = request_filters(resource.options(), query.as_deref());
    tracing::debug!(resource = resource.name(), filtered = filters.is_some(), "Listing entities");

    let entities = resource
        .find_all_entities_by(filters)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    Ok(Json(entities))
}

pub async fn count_all<R: CrudResource>(
    State(resource): State<Arc<R>>,
    RawQuery(query): RawQuery,
) -> Result<Json<u64>, ApiError> {
    if !resource.options().allow_count {
        tracing::warn!(resource = resource.name(), "Rejected count request, counting is disabled");
        return Err(ApiError::forbidden("counting"));
    }

    let filters = request_filters(resource.options(), query.as_deref());
    let count = resource
        .count_all_entities_by(filters)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    Ok(Json(count))
}

pub async fn find_by_id<R: CrudResource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<EntityId>,
) -> Result<Json<R::Entity>, ApiError> {
    match resource
        .find_entity_by_id(id)
        .await
        .map_err(|e| resource.translator().translate(e))?
    {
        Some(entity) => Ok(Json(entity)),
        None => Err(ApiError::not_found(resource.name(), id)),
    }
}

pub async fn add<R: CrudResource>(
    State(resource): State<Arc<R>>,
    uri: OriginalUri,
    Json(entity): Json<R::Entity>,
) -> Result<(StatusCode, HeaderMap, Json<R::Entity>), ApiError> {
    if let Some(id) = entity.id() {
        tracing::warn!(resource = resource.name(), id, "Rejected create request carrying an id");
        return Err(ApiError::malformed_body("BodyIdIsNotNull", BODY_ID_NOT_NULL_MESSAGE));
    }

    let saved = resource
        .save_entity(entity)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    let headers = location_headers(&uri, saved.id())?;
    tracing::debug!(resource = resource.name(), id = ?saved.id(), "Created entity");
    Ok((StatusCode::CREATED, headers, Json(saved)))
}

pub async fn update<R: CrudResource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<EntityId>,
    uri: OriginalUri,
    Json(mut entity): Json<R::Entity>,
) -> Result<(HeaderMap, Json<R::Entity>), ApiError> {
    if let Some(body_id) = entity.id()
        && body_id != id
    {
        tracing::warn!(
            resource = resource.name(),
            path_id = id,
            body_id,
            "Rejected update request with mismatching id"
        );
        return Err(ApiError::malformed_body(
            "BodyIdDoesNotMatchPath",
            BODY_ID_MISMATCH_MESSAGE,
        ));
    }
    entity.set_id(Some(id));

    let saved = resource
        .save_entity(entity)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    let headers = location_headers(&uri, saved.id())?;
    Ok((headers, Json(saved)))
}

pub async fn delete<R: CrudResource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode, ApiError> {
    resource
        .delete_entity(id)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    tracing::debug!(resource = resource.name(), id, "Deleted entity");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all<R: CrudResource>(
    State(resource): State<Arc<R>>,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, ApiError> {
    if !resource.options().allow_delete_all {
        tracing::warn!(resource = resource.name(), "Rejected delete-all request, delete-all is disabled");
        return Err(ApiError::forbidden("delete-all"));
    }

    let filters = request_filters(resource.options(), query.as_deref());
    tracing::debug!(resource = resource.name(), filtered = filters.is_some(), "Deleting entities");
    resource
        .delete_all_entities_by(filters)
        .await
        .map_err(|e| resource.translator().translate(e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Routes of one resource, meant to be nested under its base path.
pub fn router<R: CrudResource>(resource: Arc<R>) -> Router {
    let cors_enabled = resource.options().cors;
    let router = Router::new()
        .route(
            "/",
            get(find_all::<R>).post(add::<R>).delete(delete_all::<R>),
        )
        .route("/_count", get(count_all::<R>))
        .route(
            "/{id}",
            get(find_by_id::<R>).put(update::<R>).delete(delete::<R>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(resource);

    if cors_enabled {
        router.layer(cors::layer())
    } else {
        router
    }
}

/// Wraps the assembled application so `/customers/` reaches the same
/// handlers as `/customers`.
///
/// Apply it to the outermost router: routing happens before any layer added
/// with `Router::layer`, so the slash has to be trimmed first.
///
/// ```rust,ignore
/// let app = normalized(Router::new().nest("/api/customers", router(customers)));
/// axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
/// ```
pub fn normalized(app: Router) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(app)
}
