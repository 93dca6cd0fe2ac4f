use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::order::OrderStatus;

/// Domain events emitted by the service layer.
///
/// Consumers treat these as invalidation hints and refetch the affected
/// rows, so duplicate or out-of-order delivery is harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        stall_id: Uuid,
        customer_id: Uuid,
    },
    OrderStatusChanged {
        order_id: Uuid,
        stall_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    StockAdjusted {
        menu_item_id: Uuid,
        stall_id: Uuid,
        new_stock: i32,
    },
    SlotBooked {
        slot_date: NaiveDate,
        time: String,
    },
    StallUpdated(Uuid),
    MenuItemCreated(Uuid),
    MenuItemDeleted(Uuid),
    ReviewSubmitted {
        review_id: Uuid,
        order_id: Uuid,
        stall_id: Uuid,
    },
}

impl Event {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::SlotBooked { .. } => "slot_booked",
            Event::StallUpdated(_) => "stall_updated",
            Event::MenuItemCreated(_) => "menu_item_created",
            Event::MenuItemDeleted(_) => "menu_item_deleted",
            Event::ReviewSubmitted { .. } => "review_submitted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the processor is
    /// gone. Event delivery is never allowed to fail a user action.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Fan-out side of the event pipeline. Subscribers get every event that
/// passes through the processor; a lagging subscriber drops messages and is
/// expected to refetch.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Event>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    fn publish(&self, event: Event) {
        // Err means no subscribers right now; nothing to do.
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Event processor loop: logs each event and republishes it on the change
/// feed. Runs until the last `EventSender` is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, feed: ChangeFeed) {
    while let Some(event) = receiver.recv().await {
        debug!(kind = event.kind(), "processing event");
        feed.publish(event);
    }
    debug!("event channel closed; processor exiting");
}
