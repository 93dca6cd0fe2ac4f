use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{entities::menu_item, errors::ServiceError};

/// Snapshot of a menu item as it looked when added to the cart. The stock
/// field is the clamp ceiling for quantity edits; checkout re-validates
/// against live stock anyway.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CartItemSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
}

impl From<&menu_item::Model> for CartItemSnapshot {
    fn from(item: &menu_item::Model) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            stock: item.stock,
            category: item.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CartLine {
    pub item: CartItemSnapshot,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.item.price * self.quantity as i64
    }
}

/// One customer's cart. All lines belong to a single stall.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub stall_id: Option<Uuid>,
    pub stall_name: Option<String>,
    pub lines: Vec<CartLine>,
    pub notes: String,
}

impl Cart {
    fn reset(&mut self) {
        self.stall_id = None;
        self.stall_name = None;
        self.lines.clear();
        self.notes.clear();
    }

    fn clear_binding_if_empty(&mut self) {
        if self.lines.is_empty() {
            self.reset();
        }
    }
}

/// Read view with the derived totals, recomputed on every call.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CartView {
    pub stall_id: Option<Uuid>,
    pub stall_name: Option<String>,
    pub lines: Vec<CartLine>,
    pub notes: String,
    pub total_items: i32,
    pub total_amount: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total_items = cart.lines.iter().map(|l| l.quantity).sum();
        let total_amount = cart.lines.iter().map(|l| l.line_total()).sum();
        Self {
            stall_id: cart.stall_id,
            stall_name: cart.stall_name.clone(),
            lines: cart.lines.clone(),
            notes: cart.notes.clone(),
            total_items,
            total_amount,
        }
    }
}

/// Cart aggregator. Carts are ephemeral per-customer state, held only in
/// process memory and gone on restart; durable state begins at checkout.
#[derive(Clone, Default)]
pub struct CartService {
    carts: Arc<DashMap<Uuid, Cart>>,
}

impl CartService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `item`. An add from a different stall than the cart
    /// is bound to replaces the entire cart with this single line; a
    /// same-stall add increments the existing line clamped to stock, or
    /// inserts a new line at quantity 1.
    #[instrument(skip(self, item), fields(customer_id = %customer_id, item_id = %item.id))]
    pub fn add_item(
        &self,
        customer_id: Uuid,
        item: &menu_item::Model,
    ) -> Result<CartView, ServiceError> {
        if item.stock < 1 {
            return Err(ServiceError::OutOfStock(format!(
                "{} is out of stock",
                item.name
            )));
        }

        let mut cart = self.carts.entry(customer_id).or_default();

        let switching_stall = cart
            .stall_id
            .map(|bound| bound != item.stall_id)
            .unwrap_or(false);

        if switching_stall {
            cart.reset();
        }

        cart.stall_id = Some(item.stall_id);
        cart.stall_name = Some(item.stall_name.clone());

        if let Some(line) = cart.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.quantity = (line.quantity + 1).min(item.stock);
            line.item = CartItemSnapshot::from(item);
        } else {
            cart.lines.push(CartLine {
                item: CartItemSnapshot::from(item),
                quantity: 1,
            });
        }

        Ok(CartView::from(&*cart))
    }

    /// Removes the line entirely. Removing the last line also clears the
    /// stall binding and notes.
    pub fn remove_item(&self, customer_id: Uuid, item_id: Uuid) -> CartView {
        let mut cart = self.carts.entry(customer_id).or_default();
        cart.lines.retain(|l| l.item.id != item_id);
        cart.clear_binding_if_empty();
        CartView::from(&*cart)
    }

    /// Sets a line's quantity, clamped to the item's stock. A quantity of
    /// zero or less removes the line, exactly like `remove_item`.
    pub fn update_quantity(&self, customer_id: Uuid, item_id: Uuid, quantity: i32) -> CartView {
        if quantity <= 0 {
            return self.remove_item(customer_id, item_id);
        }

        let mut cart = self.carts.entry(customer_id).or_default();
        if let Some(line) = cart.lines.iter_mut().find(|l| l.item.id == item_id) {
            line.quantity = quantity.min(line.item.stock);
        }
        CartView::from(&*cart)
    }

    pub fn set_notes(&self, customer_id: Uuid, notes: String) -> CartView {
        let mut cart = self.carts.entry(customer_id).or_default();
        cart.notes = notes;
        CartView::from(&*cart)
    }

    /// Resets lines, stall binding, and notes together.
    pub fn clear(&self, customer_id: Uuid) -> CartView {
        let mut cart = self.carts.entry(customer_id).or_default();
        cart.reset();
        CartView::from(&*cart)
    }

    pub fn get(&self, customer_id: Uuid) -> CartView {
        match self.carts.get(&customer_id) {
            Some(cart) => CartView::from(&*cart),
            None => CartView::from(&Cart::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: Uuid, stall_id: Uuid, name: &str, price: i64, stock: i32) -> menu_item::Model {
        menu_item::Model {
            id,
            stall_id,
            stall_name: format!("Stall for {}", name),
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            category: "rice-meals".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_add_item_twice_accumulates_quantity_and_total() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall = Uuid::new_v4();
        let shawarma = item(Uuid::new_v4(), stall, "Shawarma Rice", 65, 25);

        service.add_item(customer, &shawarma).unwrap();
        let view = service.add_item(customer, &shawarma).unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.total_items, 2);
        assert_eq!(view.total_amount, 130);
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall = Uuid::new_v4();
        let fries = item(Uuid::new_v4(), stall, "Fries", 35, 3);

        for _ in 0..10 {
            service.add_item(customer, &fries).unwrap();
        }

        let view = service.get(customer);
        assert_eq!(view.lines[0].quantity, 3);
    }

    #[test]
    fn test_add_from_other_stall_replaces_cart() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall_x = Uuid::new_v4();
        let stall_y = Uuid::new_v4();
        let item_a = item(Uuid::new_v4(), stall_x, "Adobo Rice", 55, 10);
        let item_b = item(Uuid::new_v4(), stall_x, "Iced Tea", 20, 50);
        let item_c = item(Uuid::new_v4(), stall_y, "Fish Ball", 20, 50);

        service.add_item(customer, &item_a).unwrap();
        service.add_item(customer, &item_b).unwrap();
        let view = service.add_item(customer, &item_c).unwrap();

        assert_eq!(view.stall_id, Some(stall_y));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].item.id, item_c.id);
        assert_eq!(view.lines[0].quantity, 1);
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let service = CartService::new();
        let stall = Uuid::new_v4();
        let menu_entry = item(Uuid::new_v4(), stall, "Siomai Rice", 50, 20);

        let via_update = Uuid::new_v4();
        service.add_item(via_update, &menu_entry).unwrap();
        service.set_notes(via_update, "extra chili".to_string());
        let after_update = service.update_quantity(via_update, menu_entry.id, 0);

        let via_remove = Uuid::new_v4();
        service.add_item(via_remove, &menu_entry).unwrap();
        service.set_notes(via_remove, "extra chili".to_string());
        let after_remove = service.remove_item(via_remove, menu_entry.id);

        for view in [&after_update, &after_remove] {
            assert!(view.lines.is_empty());
            assert_eq!(view.stall_id, None);
            assert_eq!(view.stall_name, None);
            assert_eq!(view.notes, "");
        }
    }

    #[test]
    fn test_update_quantity_clamps_to_stock() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall = Uuid::new_v4();
        let fries = item(Uuid::new_v4(), stall, "Fries", 35, 3);

        service.add_item(customer, &fries).unwrap();
        let view = service.update_quantity(customer, fries.id, 99);
        assert_eq!(view.lines[0].quantity, 3);
    }

    #[test]
    fn test_add_out_of_stock_item_rejected() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall = Uuid::new_v4();
        let gone = item(Uuid::new_v4(), stall, "Halo-Halo", 45, 0);

        let err = service.add_item(customer, &gone).unwrap_err();
        assert!(matches!(err, ServiceError::OutOfStock(_)));
        assert!(service.get(customer).lines.is_empty());
    }

    #[test]
    fn test_clear_resets_everything() {
        let service = CartService::new();
        let customer = Uuid::new_v4();
        let stall = Uuid::new_v4();
        let burger = item(Uuid::new_v4(), stall, "Burger", 45, 18);

        service.add_item(customer, &burger).unwrap();
        service.set_notes(customer, "no onions".to_string());
        let view = service.clear(customer);

        assert!(view.lines.is_empty());
        assert_eq!(view.stall_id, None);
        assert_eq!(view.notes, "");
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_amount, 0);
    }
}
