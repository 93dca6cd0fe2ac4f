use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::stall::{self, Entity as StallEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Input for creating or replacing a menu item.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct MenuItemInput {
    #[validate(length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: i64,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
}

/// Read-mostly store of stalls and menu items. Writes are vendor actions,
/// scoped to the vendor's own stall.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists stalls sorted by stall number, ascending. Creation time breaks
    /// ties so the listing is deterministic regardless of insertion order.
    #[instrument(skip(self))]
    pub async fn list_stalls(&self) -> Result<Vec<stall::Model>, ServiceError> {
        Ok(StallEntity::find()
            .order_by_asc(stall::Column::StallNumber)
            .order_by_asc(stall::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Case-insensitive name search, same ordering as `list_stalls`.
    #[instrument(skip(self))]
    pub async fn search_stalls(&self, query: &str) -> Result<Vec<stall::Model>, ServiceError> {
        let pattern = format!("%{}%", query.trim().to_lowercase());
        Ok(StallEntity::find()
            .filter(Expr::expr(Func::lower(Expr::col(stall::Column::Name))).like(pattern))
            .order_by_asc(stall::Column::StallNumber)
            .order_by_asc(stall::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_stall(&self, id: Uuid) -> Result<stall::Model, ServiceError> {
        StallEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stall {} not found", id)))
    }

    /// Vendor open/close toggle.
    #[instrument(skip(self))]
    pub async fn set_open(&self, stall_id: Uuid, is_open: bool) -> Result<stall::Model, ServiceError> {
        let stall = self.get_stall(stall_id).await?;

        let mut active: stall::ActiveModel = stall.into();
        active.is_open = Set(is_open);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StallUpdated(stall_id))
            .await;

        info!(stall_id = %stall_id, is_open, "stall open flag updated");
        Ok(updated)
    }

    /// Lists menu items, optionally for one stall, name ascending.
    #[instrument(skip(self))]
    pub async fn list_menu_items(
        &self,
        stall_id: Option<Uuid>,
    ) -> Result<Vec<menu_item::Model>, ServiceError> {
        let mut query = MenuItemEntity::find().order_by_asc(menu_item::Column::Name);
        if let Some(stall_id) = stall_id {
            query = query.filter(menu_item::Column::StallId.eq(stall_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Most recently added in-stock items, for the storefront's
    /// recommendation strip.
    #[instrument(skip(self))]
    pub async fn recommended_items(&self, limit: u64) -> Result<Vec<menu_item::Model>, ServiceError> {
        Ok(MenuItemEntity::find()
            .filter(menu_item::Column::Stock.gt(0))
            .order_by_desc(menu_item::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_menu_item(&self, id: Uuid) -> Result<menu_item::Model, ServiceError> {
        MenuItemEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", id)))
    }

    #[instrument(skip(self, input), fields(stall_id = %stall_id, name = %input.name))]
    pub async fn create_menu_item(
        &self,
        stall_id: Uuid,
        input: MenuItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        input.validate()?;
        let stall = self.get_stall(stall_id).await?;

        let model = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            stall_id: Set(stall_id),
            stall_name: Set(stall.name),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description.trim().to_string()),
            price: Set(input.price),
            stock: Set(input.stock),
            category: Set(input.category.trim().to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::MenuItemCreated(model.id))
            .await;

        info!(item_id = %model.id, "menu item created");
        Ok(model)
    }

    #[instrument(skip(self, input), fields(stall_id = %stall_id, item_id = %item_id))]
    pub async fn update_menu_item(
        &self,
        stall_id: Uuid,
        item_id: Uuid,
        input: MenuItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        input.validate()?;
        let item = self.owned_item(stall_id, item_id).await?;

        let mut active: menu_item::ActiveModel = item.into();
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description.trim().to_string());
        active.price = Set(input.price);
        active.stock = Set(input.stock);
        active.category = Set(input.category.trim().to_string());
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_item(&self, stall_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let item = self.owned_item(stall_id, item_id).await?;

        MenuItemEntity::delete_by_id(item.id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MenuItemDeleted(item_id))
            .await;

        info!(item_id = %item_id, "menu item deleted");
        Ok(())
    }

    /// Vendor stock edit: an absolute set, unlike the checkout path's
    /// conditional decrement.
    #[instrument(skip(self))]
    pub async fn set_stock(
        &self,
        stall_id: Uuid,
        item_id: Uuid,
        stock: i32,
    ) -> Result<menu_item::Model, ServiceError> {
        if stock < 0 {
            return Err(ServiceError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }

        let item = self.owned_item(stall_id, item_id).await?;

        let mut active: menu_item::ActiveModel = item.into();
        active.stock = Set(stock);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                menu_item_id: item_id,
                stall_id,
                new_stock: stock,
            })
            .await;

        Ok(updated)
    }

    /// Fetches an item and checks it belongs to the vendor's stall.
    async fn owned_item(
        &self,
        stall_id: Uuid,
        item_id: Uuid,
    ) -> Result<menu_item::Model, ServiceError> {
        let item = self.get_menu_item(item_id).await?;
        if item.stall_id != stall_id {
            return Err(ServiceError::Forbidden(
                "Menu item belongs to a different stall".to_string(),
            ));
        }
        Ok(item)
    }
}
