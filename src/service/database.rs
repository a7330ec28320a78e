use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
    TransactionTrait,
};
use std::marker::PhantomData;

use super::{CrudService, ServiceError};
use crate::core::{CrudIdentifiable, EntityId};
use crate::filtering::{FilterSet, apply_filters};

/// Binds an API entity to its Sea-ORM entity.
///
/// ```rust,ignore
/// impl PersistentEntity for Order {
///     type EntityType = order::Entity;
///     type ColumnType = order::Column;
///     type ActiveModelType = order::ActiveModel;
///
///     const RESOURCE_NAME: &'static str = "order";
///
///     fn into_active_model(self) -> order::ActiveModel {
///         order::ActiveModel {
///             id: self.id.map_or(NotSet, Set),
///             amount: Set(self.amount),
///             customer_id: Set(self.customer_id),
///         }
///     }
///
///     fn filterable_columns() -> Vec<(&'static str, order::Column)> {
///         vec![("id", order::Column::Id), ("amount", order::Column::Amount)]
///     }
///
///     fn association_columns() -> Vec<(&'static str, order::Column)> {
///         vec![("customer", order::Column::CustomerId)]
///     }
/// }
/// ```
pub trait PersistentEntity:
    CrudIdentifiable + From<<Self::EntityType as EntityTrait>::Model>
{
    type EntityType: EntityTrait + Sync;
    type ColumnType: ColumnTrait + Send + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;

    const RESOURCE_NAME: &'static str;

    /// Active model with every field set; the primary key is `NotSet` when
    /// the entity has no id yet.
    fn into_active_model(self) -> Self::ActiveModelType;

    /// Field names accepted by `Eq`, `Le`, `Ge` and `Like` predicates
    fn filterable_columns() -> Vec<(&'static str, Self::ColumnType)>;

    /// Association names accepted by `Id` predicates, mapped to the foreign-key column
    #[must_use]
    fn association_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![]
    }
}

/// A [`CrudService`] delegating to a Sea-ORM connection.
///
/// `save`, `delete` and `delete_by` each run inside one transaction that is
/// committed on success and rolled back when the call fails.
pub struct DatabaseService<T> {
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> T>,
}

impl<T> DatabaseService<T> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

impl<T: PersistentEntity> DatabaseService<T> {
    fn condition(&self, filters: &FilterSet) -> Result<Condition, ServiceError> {
        Ok(apply_filters(
            filters,
            &T::filterable_columns(),
            &T::association_columns(),
            self.db.get_database_backend(),
        )?)
    }
}

#[async_trait]
impl<T> CrudService<T> for DatabaseService<T>
where
    T: PersistentEntity,
    <T::EntityType as EntityTrait>::Model: sea_orm::IntoActiveModel<T::ActiveModelType> + Sync,
    <<T::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<EntityId>,
{
    async fn find_by_id(&self, id: EntityId) -> Result<Option<T>, ServiceError> {
        let model = T::EntityType::find_by_id(id).one(&self.db).await?;
        Ok(model.map(T::from))
    }

    async fn find_by(&self, filters: &FilterSet) -> Result<Vec<T>, ServiceError> {
        let condition = self.condition(filters)?;
        let models = T::EntityType::find()
            .filter(condition)
            .all(&self.db)
            .await?;
        tracing::debug!(
            resource = T::RESOURCE_NAME,
            filters = filters.len(),
            found = models.len(),
            "Loaded entities"
        );
        Ok(models.into_iter().map(T::from).collect())
    }

    async fn count_by(&self, filters: &FilterSet) -> Result<u64, ServiceError> {
        let condition = self.condition(filters)?;
        let query = T::EntityType::find().filter(condition);
        Ok(PaginatorTrait::count(query, &self.db).await?)
    }

    async fn save(&self, entity: T) -> Result<T, ServiceError> {
        entity.validate()?;

        let txn = self.db.begin().await?;
        let model = match entity.id() {
            None => PersistentEntity::into_active_model(entity).insert(&txn).await?,
            Some(id) => {
                let exists = T::EntityType::find_by_id(id).one(&txn).await?.is_some();
                let active_model = PersistentEntity::into_active_model(entity);
                if exists {
                    active_model.update(&txn).await?
                } else {
                    active_model.insert(&txn).await?
                }
            }
        };
        txn.commit().await?;

        let saved = T::from(model);
        tracing::debug!(resource = T::RESOURCE_NAME, id = ?saved.id(), "Saved entity");
        Ok(saved)
    }

    async fn delete(&self, id: EntityId) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let result = T::EntityType::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        tracing::debug!(
            resource = T::RESOURCE_NAME,
            id,
            deleted = result.rows_affected,
            "Deleted entity"
        );
        Ok(())
    }

    async fn delete_by(&self, filters: &FilterSet) -> Result<(), ServiceError> {
        let condition = self.condition(filters)?;
        let txn = self.db.begin().await?;
        let result = T::EntityType::delete_many()
            .filter(condition)
            .exec(&txn)
            .await?;
        txn.commit().await?;
        tracing::debug!(
            resource = T::RESOURCE_NAME,
            filters = filters.len(),
            deleted = result.rows_affected,
            "Deleted entities"
        );
        Ok(())
    }
}
