use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A stall's menu entry. Prices are integer currency units; stock is the
/// number of servings the vendor can still sell today.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub stall_id: Uuid,

    /// Denormalized for order snapshots and listings
    pub stall_name: String,

    #[validate(length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"))]
    pub name: String,

    pub description: String,

    /// Unit price in whole currency units
    pub price: i64,

    /// Remaining servings; never negative
    pub stock: i32,

    /// Category tag, e.g. "rice-meals", "snacks", "drinks", "combo"
    pub category: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Display flag derived from stock, never stored.
    pub fn is_popular(&self) -> bool {
        self.stock > 10
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stall::Entity",
        from = "Column::StallId",
        to = "super::stall::Column::Id"
    )]
    Stall,
}

impl Related<super::stall::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stall.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
