use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete pickup time bucket with finite concurrent-order capacity.
///
/// Invariant: `booked <= capacity`. A slot is offerable only while
/// `booked < capacity`; reservation is a conditional increment executed
/// inside the checkout transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pickup_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub slot_date: NaiveDate,

    /// Zero-padded `HH:MM` 24-hour label, 5-minute granularity
    pub time: String,

    pub capacity: i32,
    pub booked: i32,

    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_available(&self) -> bool {
        self.booked < self.capacity
    }

    pub fn remaining(&self) -> i32 {
        (self.capacity - self.booked).max(0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
