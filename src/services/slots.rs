use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::pickup_slot::{self, Entity as PickupSlotEntity},
    errors::ServiceError,
};

/// Meal periods partition the serving day. Windows are inclusive at both
/// ends, at 5-minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    /// 08:00-10:55
    Breakfast,
    /// 11:00-17:55
    Lunch,
    /// 18:00-20:00
    Dinner,
}

impl MealPeriod {
    /// (first hour, last hour, last minute of the last hour)
    fn window(&self) -> (u32, u32, u32) {
        match self {
            MealPeriod::Breakfast => (8, 10, 55),
            MealPeriod::Lunch => (11, 17, 55),
            MealPeriod::Dinner => (18, 20, 0),
        }
    }

    /// Ordered `HH:MM` labels for this period.
    pub fn labels(&self) -> Vec<String> {
        let (first_hour, last_hour, last_minute) = self.window();
        let mut labels = Vec::new();
        for hour in first_hour..=last_hour {
            let max_minute = if hour == last_hour { last_minute } else { 55 };
            let mut minute = 0;
            while minute <= max_minute {
                labels.push(format!("{:02}:{:02}", hour, minute));
                minute += 5;
            }
        }
        labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels().iter().any(|l| l == label)
    }
}

/// Every label of the day, breakfast through dinner, in order.
pub fn day_labels() -> Vec<String> {
    let mut labels = MealPeriod::Breakfast.labels();
    labels.extend(MealPeriod::Lunch.labels());
    labels.extend(MealPeriod::Dinner.labels());
    labels
}

pub fn is_valid_label(label: &str) -> bool {
    day_labels().iter().any(|l| l == label)
}

/// Slot allocator: materializes the day's time buckets and hands out
/// reservations with an atomic conditional increment, so a full bucket can
/// never be over-booked even under concurrent checkouts.
#[derive(Clone)]
pub struct SlotService {
    db: Arc<DatabaseConnection>,
    capacity: i32,
}

impl SlotService {
    pub fn new(db: Arc<DatabaseConnection>, capacity: i32) -> Self {
        Self { db, capacity }
    }

    /// Materializes the full day catalog for `date` if it does not exist
    /// yet. Concurrent callers are reconciled by the unique (date, time)
    /// index.
    #[instrument(skip(self))]
    pub async fn ensure_day(&self, date: NaiveDate) -> Result<(), ServiceError> {
        let existing = PickupSlotEntity::find()
            .filter(pickup_slot::Column::SlotDate.eq(date))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let now = Utc::now();
        let models: Vec<pickup_slot::ActiveModel> = day_labels()
            .into_iter()
            .map(|time| pickup_slot::ActiveModel {
                id: Set(Uuid::new_v4()),
                slot_date: Set(date),
                time: Set(time),
                capacity: Set(self.capacity),
                booked: Set(0),
                created_at: Set(now),
            })
            .collect();

        let insert = PickupSlotEntity::insert_many(models)
            .on_conflict(
                OnConflict::columns([pickup_slot::Column::SlotDate, pickup_slot::Column::Time])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&*self.db)
            .await;

        match insert {
            Ok(_) | Err(DbErr::RecordNotInserted) => {
                info!(%date, "pickup slot catalog materialized");
                Ok(())
            }
            Err(e) => Err(ServiceError::DatabaseError(e)),
        }
    }

    /// Lists the day's slots, optionally restricted to one meal period.
    /// Sorted by time label; zero-padded labels make that chronological.
    #[instrument(skip(self))]
    pub async fn list_slots(
        &self,
        date: NaiveDate,
        period: Option<MealPeriod>,
    ) -> Result<Vec<pickup_slot::Model>, ServiceError> {
        self.ensure_day(date).await?;

        let slots = PickupSlotEntity::find()
            .filter(pickup_slot::Column::SlotDate.eq(date))
            .order_by_asc(pickup_slot::Column::Time)
            .all(&*self.db)
            .await?;

        Ok(match period {
            Some(p) => slots.into_iter().filter(|s| p.contains(&s.time)).collect(),
            None => slots,
        })
    }

    /// Reserves one booking in the (date, time) bucket, inside the caller's
    /// transaction. The increment is conditional on remaining capacity; zero
    /// rows affected means the bucket is full (or the label unknown) and the
    /// whole checkout rolls back.
    pub async fn reserve(
        &self,
        txn: &DatabaseTransaction,
        date: NaiveDate,
        time: &str,
    ) -> Result<(), ServiceError> {
        if !is_valid_label(time) {
            return Err(ServiceError::ValidationError(format!(
                "{} is not a valid pickup time",
                time
            )));
        }

        let result = PickupSlotEntity::update_many()
            .col_expr(
                pickup_slot::Column::Booked,
                Expr::col(pickup_slot::Column::Booked).add(1),
            )
            .filter(pickup_slot::Column::SlotDate.eq(date))
            .filter(pickup_slot::Column::Time.eq(time))
            .filter(
                Expr::col(pickup_slot::Column::Booked)
                    .lt(Expr::col(pickup_slot::Column::Capacity)),
            )
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::SlotUnavailable(format!(
                "Pickup slot {} is fully booked",
                time
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_breakfast_window() {
        let labels = MealPeriod::Breakfast.labels();
        assert_eq!(labels.first().unwrap(), "08:00");
        assert_eq!(labels.last().unwrap(), "10:55");
        // 3 hours x 12 five-minute steps
        assert_eq!(labels.len(), 36);
    }

    #[test]
    fn test_lunch_window() {
        let labels = MealPeriod::Lunch.labels();
        assert_eq!(labels.first().unwrap(), "11:00");
        assert_eq!(labels.last().unwrap(), "17:55");
        assert_eq!(labels.len(), 84);
    }

    #[test]
    fn test_dinner_window_ends_on_the_hour() {
        let labels = MealPeriod::Dinner.labels();
        assert_eq!(labels.first().unwrap(), "18:00");
        assert_eq!(labels.last().unwrap(), "20:00");
        // 18:00-19:55 plus the single 20:00 slot
        assert_eq!(labels.len(), 25);
    }

    #[test]
    fn test_day_labels_are_sorted_and_unique() {
        let labels = day_labels();
        let mut sorted = labels.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(labels, sorted);
        assert_eq!(labels.len(), 36 + 84 + 25);
    }

    #[test]
    fn test_label_validation() {
        assert!(is_valid_label("08:00"));
        assert!(is_valid_label("12:35"));
        assert!(is_valid_label("20:00"));
        assert!(!is_valid_label("07:55"));
        assert!(!is_valid_label("20:05"));
        assert!(!is_valid_label("12:03"));
        assert!(!is_valid_label("8:00"));
        assert!(!is_valid_label("lunchtime"));
    }

    proptest! {
        #[test]
        fn prop_every_label_is_zero_padded_five_minute(idx in 0usize..145) {
            let labels = day_labels();
            let label = &labels[idx];
            prop_assert_eq!(label.len(), 5);
            let (h, m) = label.split_once(':').unwrap();
            let hour: u32 = h.parse().unwrap();
            let minute: u32 = m.parse().unwrap();
            prop_assert!((8..=20).contains(&hour));
            prop_assert_eq!(minute % 5, 0);
        }
    }
}
