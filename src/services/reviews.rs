use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::order::{Entity as OrderEntity, OrderStatus},
    entities::review::{self, Entity as ReviewEntity},
    entities::stall::{self, Entity as StallEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SubmitReviewInput {
    pub order_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Food rating must be between 1 and 5"))]
    pub food_rating: i32,
    #[validate(range(min = 1, max = 5, message = "Service rating must be between 1 and 5"))]
    pub service_rating: i32,
    pub food_comment: Option<String>,
    pub service_comment: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Reviews: one per completed order. Submission also folds the rating into
/// the stall's running average, in the same transaction.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(customer_id = %customer_id, order_id = %input.order_id))]
    pub async fn submit(
        &self,
        customer_id: Uuid,
        input: SubmitReviewInput,
    ) -> Result<review::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let order = OrderEntity::find_by_id(input.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", input.order_id))
            })?;

        if order.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "Only the customer who placed the order can rate it".to_string(),
            ));
        }

        if order.status != OrderStatus::Completed {
            return Err(ServiceError::ValidationError(
                "Only completed orders can be rated".to_string(),
            ));
        }

        let existing = ReviewEntity::find()
            .filter(review::Column::OrderId.eq(order.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "This order has already been rated".to_string(),
            ));
        }

        let review_id = Uuid::new_v4();
        let model = review::ActiveModel {
            id: Set(review_id),
            order_id: Set(order.id),
            stall_id: Set(order.stall_id),
            customer_id: Set(customer_id),
            food_rating: Set(input.food_rating),
            service_rating: Set(input.service_rating),
            food_comment: Set(input.food_comment.filter(|c| !c.trim().is_empty())),
            service_comment: Set(input.service_comment.filter(|c| !c.trim().is_empty())),
            anonymous: Set(input.anonymous),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        // Fold this order's combined rating into the stall aggregate.
        let stall = StallEntity::find_by_id(order.stall_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stall {} not found", order.stall_id))
            })?;

        let combined = (input.food_rating + input.service_rating) as f64 / 2.0;
        let new_total = stall.total_ratings + 1;
        let new_rating =
            (stall.rating * stall.total_ratings as f64 + combined) / new_total as f64;

        let mut stall_active: stall::ActiveModel = stall.into();
        stall_active.rating = Set(new_rating);
        stall_active.total_ratings = Set(new_total);
        stall_active.updated_at = Set(Some(Utc::now()));
        stall_active.update(&txn).await?;

        txn.commit().await?;

        info!(review_id = %review_id, "review submitted");

        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                review_id,
                order_id: model.order_id,
                stall_id: model.stall_id,
            })
            .await;

        Ok(model)
    }

    /// A stall's reviews, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_stall(&self, stall_id: Uuid) -> Result<Vec<review::Model>, ServiceError> {
        Ok(ReviewEntity::find()
            .filter(review::Column::StallId.eq(stall_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
