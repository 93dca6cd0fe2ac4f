use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::order::{self, Entity as OrderEntity, OrderStatus, PaymentMethod},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::stall::Entity as StallEntity,
    errors::ServiceError,
    events::{Event, EventSender},
    services::slots::SlotService,
};

/// One requested line of a new order; quantities are re-validated against
/// live stock inside the checkout transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderInput {
    pub payment_method: PaymentMethod,
    pub pickup_date: NaiveDate,
    #[validate(length(min = 5, max = 5, message = "Pickup time must be an HH:MM label"))]
    pub pickup_time: String,
    pub notes: Option<String>,
}

/// An order with its snapshot line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Who is asking. Customers see their own orders; vendors see their
/// stall's.
#[derive(Debug, Clone, Copy)]
pub enum OrderViewer {
    Customer(Uuid),
    Vendor(Uuid),
}

/// Revenue roll-up for a stall: orders that are ready or already picked up.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SalesSummary {
    pub order_count: usize,
    pub total_revenue: i64,
}

/// The order ledger. Checkout is a single transaction: stock is decremented
/// with a conditional update per line, the pickup slot is reserved the same
/// way, the per-stall order number is allocated, and the order plus its
/// snapshot items are inserted. Any failure rolls the whole thing back.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    slots: SlotService,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, slots: SlotService) -> Self {
        Self {
            db,
            event_sender,
            slots,
        }
    }

    /// Creates an order from the given cart lines.
    ///
    /// Cash orders enter the ledger `pending`; online orders enter
    /// `confirmed` (payment acknowledged at creation).
    #[instrument(skip(self, lines, input), fields(customer_id = %customer_id, stall_id = %stall_id, line_count = lines.len()))]
    pub async fn place_order(
        &self,
        customer_id: Uuid,
        customer_name: &str,
        stall_id: Uuid,
        lines: &[OrderLine],
        input: PlaceOrderInput,
    ) -> Result<OrderDetails, ServiceError> {
        input.validate()?;

        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Cannot place an order with an empty cart".to_string(),
            ));
        }

        // The slot catalog for the pickup date must exist before the
        // transaction tries to reserve into it.
        self.slots.ensure_day(input.pickup_date).await?;

        let txn = self.db.begin().await?;

        let stall = StallEntity::find_by_id(stall_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stall {} not found", stall_id)))?;

        // Re-validate and decrement stock per line. The conditional update
        // is the stock check: zero rows affected means someone else took
        // the last servings and the order must fail as a whole.
        let mut total_amount = 0i64;
        let mut snapshots: Vec<(menu_item::Model, i32)> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "Line quantity must be at least 1".to_string(),
                ));
            }

            let item = MenuItemEntity::find_by_id(line.menu_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Menu item {} not found", line.menu_item_id))
                })?;

            if item.stall_id != stall_id {
                return Err(ServiceError::ValidationError(format!(
                    "{} belongs to a different stall",
                    item.name
                )));
            }

            let result = MenuItemEntity::update_many()
                .col_expr(
                    menu_item::Column::Stock,
                    Expr::col(menu_item::Column::Stock).sub(line.quantity),
                )
                .filter(menu_item::Column::Id.eq(item.id))
                .filter(menu_item::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                warn!(item_id = %item.id, requested = line.quantity, "stock check failed at checkout");
                return Err(ServiceError::OutOfStock(format!(
                    "{} is out of stock",
                    item.name
                )));
            }

            total_amount += item.price * line.quantity as i64;
            snapshots.push((item, line.quantity));
        }

        self.slots
            .reserve(&txn, input.pickup_date, &input.pickup_time)
            .await?;

        // Per-stall sequential display number
        let order_number = OrderEntity::find()
            .filter(order::Column::StallId.eq(stall_id))
            .order_by_desc(order::Column::OrderNumber)
            .one(&txn)
            .await?
            .map(|o| o.order_number + 1)
            .unwrap_or(1);

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let status = input.payment_method.initial_status();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number),
            customer_id: Set(customer_id),
            customer_name: Set(customer_name.to_string()),
            stall_id: Set(stall_id),
            stall_name: Set(stall.name.clone()),
            status: Set(status),
            payment_method: Set(input.payment_method),
            pickup_date: Set(input.pickup_date),
            pickup_time: Set(input.pickup_time.clone()),
            notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
            total_amount: Set(total_amount),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let item_models: Vec<order_item::ActiveModel> = snapshots
            .iter()
            .map(|(item, quantity)| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                menu_item_id: Set(item.id),
                name: Set(item.name.clone()),
                unit_price: Set(item.price),
                quantity: Set(*quantity),
                line_total: Set(item.price * *quantity as i64),
                created_at: Set(now),
            })
            .collect();

        OrderItemEntity::insert_many(item_models).exec(&txn).await?;

        txn.commit().await?;

        info!(
            order_id = %order_id,
            order_number,
            status = %status,
            total_amount,
            "order placed"
        );

        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id,
                stall_id,
                customer_id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::SlotBooked {
                slot_date: order_model.pickup_date,
                time: order_model.pickup_time.clone(),
            })
            .await;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderDetails {
            order: order_model,
            items,
        })
    }

    /// Fetches one order, enforcing role-scoped visibility.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        viewer: OrderViewer,
    ) -> Result<OrderDetails, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        ensure_visible(&order, viewer)?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderDetails { order, items })
    }

    /// Customer order history, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        let orders = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        self.with_items(orders).await
    }

    /// Vendor's stall orders, newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_for_stall(
        &self,
        stall_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        let mut query = OrderEntity::find()
            .filter(order::Column::StallId.eq(stall_id))
            .order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        let orders = query.all(&*self.db).await?;

        self.with_items(orders).await
    }

    /// Vendor status advance. Forward-only; re-applying the current status
    /// is a no-op.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        stall_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.stall_id != stall_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to a different stall".to_string(),
            ));
        }

        self.apply_status(order, new_status).await
    }

    /// Customer "mark as received": closes out a ready order.
    #[instrument(skip(self))]
    pub async fn mark_received(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to a different customer".to_string(),
            ));
        }

        self.apply_status(order, OrderStatus::Completed).await
    }

    /// Vendor bulk action: every `preparing` order of the stall becomes
    /// `ready`. Each per-order write is independent; one failure does not
    /// stop the rest.
    #[instrument(skip(self))]
    pub async fn mark_all_ready(&self, stall_id: Uuid) -> Result<usize, ServiceError> {
        let preparing = OrderEntity::find()
            .filter(order::Column::StallId.eq(stall_id))
            .filter(order::Column::Status.eq(OrderStatus::Preparing))
            .all(&*self.db)
            .await?;

        let mut updated = 0;
        for order in preparing {
            let order_id = order.id;
            match self.apply_status(order, OrderStatus::Ready).await {
                Ok(_) => updated += 1,
                Err(e) => {
                    error!(order_id = %order_id, error = %e, "failed to mark order ready");
                }
            }
        }

        info!(stall_id = %stall_id, updated, "marked preparing orders ready");
        Ok(updated)
    }

    /// Revenue roll-up over ready and completed orders, optionally
    /// restricted to orders created on or after `since`.
    #[instrument(skip(self))]
    pub async fn sales_summary(
        &self,
        stall_id: Uuid,
        since: Option<chrono::DateTime<Utc>>,
    ) -> Result<SalesSummary, ServiceError> {
        let mut query = OrderEntity::find()
            .filter(order::Column::StallId.eq(stall_id))
            .filter(
                order::Column::Status
                    .is_in([OrderStatus::Ready, OrderStatus::Completed]),
            );
        if let Some(since) = since {
            query = query.filter(order::Column::CreatedAt.gte(since));
        }
        let orders = query.all(&*self.db).await?;

        Ok(SalesSummary {
            order_count: orders.len(),
            total_revenue: orders.iter().map(|o| o.total_amount).sum(),
        })
    }

    async fn apply_status(
        &self,
        order: order::Model,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let old_status = order.status;

        if old_status == new_status {
            return Ok(order);
        }

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move an order from '{}' to '{}'",
                old_status, new_status
            )));
        }

        let order_id = order.id;
        let stall_id = order.stall_id;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "order status updated"
        );

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                stall_id,
                old_status,
                new_status,
            })
            .await;

        Ok(updated)
    }

    async fn with_items(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let all_items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;

        let mut by_order: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        for item in all_items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetails { order, items }
            })
            .collect())
    }
}

fn ensure_visible(order: &order::Model, viewer: OrderViewer) -> Result<(), ServiceError> {
    let visible = match viewer {
        OrderViewer::Customer(customer_id) => order.customer_id == customer_id,
        OrderViewer::Vendor(stall_id) => order.stall_id == stall_id,
    };
    if visible {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this order".to_string(),
        ))
    }
}
