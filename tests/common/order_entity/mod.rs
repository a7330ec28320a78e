use crudrest::validation::validators;
use crudrest::{CrudIdentifiable, EntityId, PersistentEntity, Validatable, ValidationErrors};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub amount: i64,
    pub customer_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Option<EntityId>,
    pub amount: i64,
    pub customer_id: EntityId,
}

impl Order {
    pub fn new(amount: i64, customer_id: EntityId) -> Self {
        Self {
            id: None,
            amount,
            customer_id,
        }
    }
}

impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            amount: model.amount,
            customer_id: model.customer_id,
        }
    }
}

impl Validatable for Order {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::range("amount", self.amount, Some(0), None));
        errors.result()
    }
}

impl CrudIdentifiable for Order {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

impl PersistentEntity for Order {
    type EntityType = Entity;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;

    const RESOURCE_NAME: &'static str = "order";

    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Set),
            amount: Set(self.amount),
            customer_id: Set(self.customer_id),
        }
    }

    fn filterable_columns() -> Vec<(&'static str, Column)> {
        vec![("id", Column::Id), ("amount", Column::Amount)]
    }

    fn association_columns() -> Vec<(&'static str, Column)> {
        vec![("customer", Column::CustomerId)]
    }
}
