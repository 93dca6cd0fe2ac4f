use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    errors::ServiceError,
};

/// Sentinel shown when a stall has no unresolved orders.
pub const NO_ORDERS: &str = "No orders";

/// Per-stall queue snapshot used to decorate stall listings.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QueueInfo {
    pub queue_size: u64,
    pub next_pickup: String,
}

/// Derived views over the order ledger: a customer's place in line and the
/// next pickup due at a stall. Nothing here holds state; every value is
/// recomputed from the ledger on read. Linear scans are deliberate - order
/// volume per stall is small, and an index would be premature.
#[derive(Clone)]
pub struct QueueService {
    db: Arc<DatabaseConnection>,
}

impl QueueService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// FIFO rank of `order` among its stall's unresolved orders, counting
    /// itself: 1 means next up. Resolved orders never count.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn queue_position(&self, order: &order::Model) -> Result<u64, ServiceError> {
        let count = OrderEntity::find()
            .filter(order::Column::StallId.eq(order.stall_id))
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Preparing]),
            )
            .filter(order::Column::CreatedAt.lte(order.created_at))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    /// Pickup time of the stall's earliest-submitted unresolved order.
    #[instrument(skip(self))]
    pub async fn next_pickup(&self, stall_id: Uuid) -> Result<Option<String>, ServiceError> {
        let earliest = OrderEntity::find()
            .filter(order::Column::StallId.eq(stall_id))
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Preparing]),
            )
            .order_by_asc(order::Column::CreatedAt)
            .one(&*self.db)
            .await?;
        Ok(earliest.map(|o| o.pickup_time))
    }

    /// All unresolved orders for the given stalls, oldest first. Used to
    /// annotate order listings with queue positions in one query instead of
    /// one count per order.
    #[instrument(skip(self, stall_ids))]
    pub async fn unresolved_for_stalls(
        &self,
        stall_ids: &[Uuid],
    ) -> Result<Vec<order::Model>, ServiceError> {
        if stall_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(OrderEntity::find()
            .filter(order::Column::StallId.is_in(stall_ids.iter().copied()))
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Preparing]),
            )
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Queue snapshots for every stall with unresolved orders, in one scan.
    /// Stalls absent from the map have an empty queue.
    #[instrument(skip(self))]
    pub async fn stall_queues(&self) -> Result<HashMap<Uuid, QueueInfo>, ServiceError> {
        let unresolved = OrderEntity::find()
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Preparing]),
            )
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(summarize_queues(&unresolved))
    }
}

/// Folds an ordered (by creation time) list of unresolved orders into
/// per-stall queue snapshots.
pub fn summarize_queues(unresolved: &[order::Model]) -> HashMap<Uuid, QueueInfo> {
    let mut queues: HashMap<Uuid, QueueInfo> = HashMap::new();
    for order in unresolved {
        let entry = queues.entry(order.stall_id).or_insert_with(|| QueueInfo {
            queue_size: 0,
            next_pickup: order.pickup_time.clone(),
        });
        entry.queue_size += 1;
    }
    queues
}

/// In-memory counterpart of `queue_position`, over a slice of the stall's
/// orders. The service method pushes the same predicate into SQL.
pub fn queue_position_in(orders: &[order::Model], target: &order::Model) -> usize {
    orders
        .iter()
        .filter(|o| {
            o.stall_id == target.stall_id
                && o.status.is_unresolved()
                && o.created_at <= target.created_at
        })
        .count()
}
