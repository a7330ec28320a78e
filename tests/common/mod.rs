#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use crudrest::{
    CrudIdentifiable, CrudOptions, CrudService, DatabaseService, EntityId, FilterSet,
    InMemoryService, ServiceError, SimpleResource, normalized, router,
};
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::{Service, ServiceExt};
use tower_http::normalize_path::NormalizePath;

pub mod customer_entity;
pub mod order_entity;

use customer_entity::Customer;
use order_entity::Order;

/// Test logging, controlled by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

pub type App = NormalizePath<Router>;

/// Customers and orders backed by the database, nested under `/api/v1`
pub fn setup_test_app(db: DatabaseConnection, options: CrudOptions) -> App {
    let customers = SimpleResource::<Customer>::new(
        "customer",
        Arc::new(DatabaseService::<Customer>::new(db.clone())),
        options.clone(),
    );
    let orders = SimpleResource::<Order>::new(
        "order",
        Arc::new(DatabaseService::<Order>::new(db)),
        options,
    );

    normalized(
        Router::new()
            .nest("/api/v1/customers", router(Arc::new(customers)))
            .nest("/api/v1/orders", router(Arc::new(orders))),
    )
}

/// Customers backed by a recording in-memory service
pub fn setup_memory_app(
    service: Arc<RecordingService<Customer>>,
    options: CrudOptions,
) -> App {
    init_tracing();
    let customers = SimpleResource::<Customer>::new("customer", service, options);
    normalized(Router::new().nest("/api/v1/customers", router(Arc::new(customers))))
}

/// Send one request and decode the JSON body, if there is one
pub async fn send<S>(
    app: &S,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Option<Value>)
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
{
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, headers, json)
}

/// In-memory service that records how it was called
pub struct RecordingService<T> {
    inner: InMemoryService<T>,
    saves: AtomicUsize,
    count_calls: AtomicUsize,
    delete_all_calls: AtomicUsize,
    filtered_calls: AtomicUsize,
    last_filters: Mutex<Option<FilterSet>>,
}

impl<T> RecordingService<T> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryService::new(),
            saves: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            delete_all_calls: AtomicUsize::new(0),
            filtered_calls: AtomicUsize::new(0),
            last_filters: Mutex::new(None),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Calls to `count_all` and `count_by`
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    /// Calls to `delete_all` and `delete_by`
    pub fn delete_all_calls(&self) -> usize {
        self.delete_all_calls.load(Ordering::SeqCst)
    }

    pub fn filtered_calls(&self) -> usize {
        self.filtered_calls.load(Ordering::SeqCst)
    }

    pub fn last_filters(&self) -> Option<FilterSet> {
        self.last_filters.lock().clone()
    }

    fn record_filters(&self, filters: &FilterSet) {
        self.filtered_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filters.lock() = Some(filters.clone());
    }
}

#[async_trait]
impl<T: CrudIdentifiable> CrudService<T> for RecordingService<T> {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<T>, ServiceError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        self.inner.find_all().await
    }

    async fn find_by(&self, filters: &FilterSet) -> Result<Vec<T>, ServiceError> {
        self.record_filters(filters);
        self.inner.find_by(filters).await
    }

    async fn count_all(&self) -> Result<u64, ServiceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.count_all().await
    }

    async fn count_by(&self, filters: &FilterSet) -> Result<u64, ServiceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.record_filters(filters);
        self.inner.count_by(filters).await
    }

    async fn save(&self, entity: T) -> Result<T, ServiceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(entity).await
    }

    async fn delete(&self, id: EntityId) -> Result<(), ServiceError> {
        self.inner.delete(id).await
    }

    async fn delete_all(&self) -> Result<(), ServiceError> {
        self.delete_all_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_all().await
    }

    async fn delete_by(&self, filters: &FilterSet) -> Result<(), ServiceError> {
        self.delete_all_calls.fetch_add(1, Ordering::SeqCst);
        self.record_filters(filters);
        self.inner.delete_by(filters).await
    }
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateCustomerTable), Box::new(CreateOrderTable)]
    }
}

pub struct CreateCustomerTable;

#[async_trait::async_trait]
impl MigrationName for CreateCustomerTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_customer_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCustomerTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(CustomerTable::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(CustomerTable::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(CustomerTable::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(CustomerTable::City).string().not_null())
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerTable::Table).to_owned())
            .await
    }
}

pub struct CreateOrderTable;

#[async_trait::async_trait]
impl MigrationName for CreateOrderTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_order_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateOrderTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(OrderTable::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(OrderTable::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(OrderTable::Amount).integer().not_null())
            .col(ColumnDef::new(OrderTable::CustomerId).integer().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_order_customer")
                    .from(OrderTable::Table, OrderTable::CustomerId)
                    .to(CustomerTable::Table, CustomerTable::Id),
            )
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderTable::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CustomerTable {
    #[sea_orm(iden = "customers")]
    Table,
    Id,
    Name,
    City,
}

#[derive(DeriveIden)]
enum OrderTable {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
    Amount,
    CustomerId,
}
