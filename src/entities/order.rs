use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An order in the ledger. Line items live in `order_items` and snapshot
/// name/price/quantity at order time, so later menu edits never rewrite
/// history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Sequential per stall; display identity, not globally unique
    pub order_number: i32,

    pub customer_id: Uuid,
    pub customer_name: String,

    pub stall_id: Uuid,
    pub stall_name: String,

    pub status: OrderStatus,
    pub payment_method: PaymentMethod,

    pub pickup_date: NaiveDate,
    /// `HH:MM` label of the reserved pickup slot
    pub pickup_time: String,

    pub notes: Option<String>,

    /// Sum over snapshot line totals, in whole currency units
    pub total_amount: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Order lifecycle. Cash orders start at `Pending`; online payment starts
/// at `Confirmed` (payment acknowledged at creation). Vendors move orders
/// forward; customers may only close a `Ready` order out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
        }
    }

    /// Forward-only transition table. Re-applying the current status is a
    /// no-op and allowed; everything not listed is rejected.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match (*self, to) {
            (Self::Pending, Self::Preparing) => true,
            (Self::Confirmed, Self::Preparing) => true,
            (Self::Preparing, Self::Ready) => true,
            (Self::Ready, Self::Completed) => true,
            (from, to) if from == to => true,
            _ => false,
        }
    }

    /// Unresolved orders are the ones counted by the queue: submitted but
    /// not yet cooked through.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Pending | Self::Preparing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "online")]
    Online,
}

impl PaymentMethod {
    /// Online payment is acknowledged at creation, so those orders enter the
    /// ledger already confirmed.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            Self::Cash => OrderStatus::Pending,
            Self::Online => OrderStatus::Confirmed,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::stall::Entity",
        from = "Column::StallId",
        to = "super::stall::Column::Id"
    )]
    Stall,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::stall::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stall.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_by_payment_method() {
        assert_eq!(PaymentMethod::Cash.initial_status(), OrderStatus::Pending);
        assert_eq!(
            PaymentMethod::Online.initial_status(),
            OrderStatus::Confirmed
        );
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_backward_and_skipping_transitions_rejected() {
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_reapplying_status_is_idempotent() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_unresolved_statuses() {
        assert!(OrderStatus::Pending.is_unresolved());
        assert!(OrderStatus::Preparing.is_unresolved());
        assert!(!OrderStatus::Confirmed.is_unresolved());
        assert!(!OrderStatus::Ready.is_unresolved());
        assert!(!OrderStatus::Completed.is_unresolved());
    }
}
