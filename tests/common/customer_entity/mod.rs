use crudrest::validation::validators::{self, Pattern};
use crudrest::{CrudIdentifiable, EntityId, PersistentEntity, Validatable, ValidationErrors};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub city: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

static NAME_PATTERN: LazyLock<Pattern> = LazyLock::new(|| Pattern::new("[A-Za-z ]*").unwrap());

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<EntityId>,
    pub name: String,
    pub city: String,
}

impl Customer {
    pub fn new(name: &str, city: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            city: city.to_string(),
        }
    }
}

impl From<Model> for Customer {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            city: model.city,
        }
    }
}

impl Validatable for Customer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::not_blank("name", &self.name));
        errors.check(validators::pattern("name", &self.name, &NAME_PATTERN));
        errors.check(validators::size("city", &self.city, Some(2), Some(40)));
        errors.result()
    }
}

impl CrudIdentifiable for Customer {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

impl PersistentEntity for Customer {
    type EntityType = Entity;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;

    const RESOURCE_NAME: &'static str = "customer";

    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: self.id.map_or(NotSet, Set),
            name: Set(self.name),
            city: Set(self.city),
        }
    }

    fn filterable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("id", Column::Id),
            ("name", Column::Name),
            ("city", Column::City),
        ]
    }
}
