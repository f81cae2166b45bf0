//! The price list members can save toward.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub category: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    pub fn new(
        name: String,
        price_minor: i64,
        description: Option<String>,
        category: Option<String>,
    ) -> ResultEngine<Self> {
        if price_minor <= 0 {
            return Err(EngineError::Validation(
                "price_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            price_minor,
            description,
            category: category.unwrap_or_else(|| "Uncategorized".to_string()),
            available: true,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub category: String,
    pub available: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CatalogItem> for ActiveModel {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            name: ActiveValue::Set(item.name.clone()),
            price_minor: ActiveValue::Set(item.price_minor),
            description: ActiveValue::Set(item.description.clone()),
            category: ActiveValue::Set(item.category.clone()),
            available: ActiveValue::Set(item.available),
            created_at: ActiveValue::Set(item.created_at),
        }
    }
}

impl TryFrom<Model> for CatalogItem {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("catalog item".to_string()))?,
            name: model.name,
            price_minor: model.price_minor,
            description: model.description,
            category: model.category,
            available: model.available,
            created_at: model.created_at,
        })
    }
}
