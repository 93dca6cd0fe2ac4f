use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's rating of a completed order. At most one per order; the
/// unique index on `order_id` backs that up.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub order_id: Uuid,

    pub stall_id: Uuid,
    pub customer_id: Uuid,

    /// 1-5
    pub food_rating: i32,
    /// 1-5
    pub service_rating: i32,

    pub food_comment: Option<String>,
    pub service_comment: Option<String>,

    pub anonymous: bool,

    pub created_at: DateTime<Utc>,
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
