use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{CatalogItem, EngineError, ResultEngine, catalog};

use super::{Engine, normalize_optional_text, normalize_required_name};

impl Engine {
    pub async fn list_catalog(&self, available_only: bool) -> ResultEngine<Vec<CatalogItem>> {
        let mut query = catalog::Entity::find()
            .order_by_asc(catalog::Column::Category)
            .order_by_asc(catalog::Column::Name);
        if available_only {
            query = query.filter(catalog::Column::Available.eq(true));
        }
        let models = query.all(&self.database).await?;
        models.into_iter().map(CatalogItem::try_from).collect()
    }

    pub async fn catalog_item(&self, item_id: Uuid) -> ResultEngine<CatalogItem> {
        let model = catalog::Entity::find_by_id(item_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("catalog item".to_string()))?;
        CatalogItem::try_from(model)
    }

    pub async fn add_catalog_item(
        &self,
        name: &str,
        price_minor: i64,
        description: Option<&str>,
        category: Option<&str>,
    ) -> ResultEngine<CatalogItem> {
        let name = normalize_required_name(name, "item")?;
        let item = CatalogItem::new(
            name,
            price_minor,
            normalize_optional_text(description),
            normalize_optional_text(category),
        )?;
        catalog::ActiveModel::from(&item)
            .insert(&self.database)
            .await?;
        Ok(item)
    }

    pub async fn update_catalog_item(
        &self,
        item_id: Uuid,
        name: &str,
        price_minor: i64,
        description: Option<&str>,
        category: Option<&str>,
        available: bool,
    ) -> ResultEngine<CatalogItem> {
        let name = normalize_required_name(name, "item")?;
        if price_minor <= 0 {
            return Err(EngineError::Validation(
                "price_minor must be > 0".to_string(),
            ));
        }
        // Existence check first so an unknown id is NotFound, not a silent no-op.
        self.catalog_item(item_id).await?;

        let active = catalog::ActiveModel {
            id: ActiveValue::Set(item_id.to_string()),
            name: ActiveValue::Set(name),
            price_minor: ActiveValue::Set(price_minor),
            description: ActiveValue::Set(normalize_optional_text(description)),
            category: ActiveValue::Set(
                normalize_optional_text(category).unwrap_or_else(|| "Uncategorized".to_string()),
            ),
            available: ActiveValue::Set(available),
            ..Default::default()
        };
        let updated = active.update(&self.database).await?;
        CatalogItem::try_from(updated)
    }

    pub async fn remove_catalog_item(&self, item_id: Uuid) -> ResultEngine<()> {
        let result = catalog::Entity::delete_by_id(item_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound("catalog item".to_string()));
        }
        Ok(())
    }
}
