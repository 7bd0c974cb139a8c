//! In-process [`OrderingStore`] used by tests and local tooling.
//!
//! Transactions snapshot every table and restore the snapshot when the
//! closure fails, which gives the same all-or-nothing outcome as Postgres.

use std::cmp::Reverse;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Availability, CartEntry, CartLine, MenuItem, MenuItemChanges, NewCartEntry, NewMenuItem,
    NewOrder, NewOrderItem, NewOutbox, NewTruck, Order, OrderItem, OrderLine, OrderStatus,
    Session, Truck, TruckChanges, User, UserRole,
};
use crate::store::OrderingStore;

/// Store operations that can be made to fail once, to exercise rollback.
#[cfg(feature = "test-support")]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrder,
    InsertOrderItems,
    ClearCart,
    AppendOutbox,
}

#[cfg(feature = "test-support")]
impl FailPoint {
    fn name(&self) -> &'static str {
        match self {
            FailPoint::InsertOrder => "insert_order",
            FailPoint::InsertOrderItems => "insert_order_items",
            FailPoint::ClearCart => "clear_cart",
            FailPoint::AppendOutbox => "append_outbox",
        }
    }
}

#[derive(Clone, Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    trucks: Vec<Truck>,
    menu_items: Vec<MenuItem>,
    carts: Vec<CartEntry>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    outbox: Vec<NewOutbox>,
    sequence: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Tables,
    #[cfg(feature = "test-support")]
    fail_at: Option<FailPoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, name: &str, role: UserRole) -> User {
        let id = self.tables.next_id();
        let user = User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
        };
        self.tables.users.push(user.clone());
        user
    }

    pub fn add_session(&mut self, user_id: i32, expires_at: DateTime<Utc>) -> Session {
        let session = Session {
            id: self.tables.next_id(),
            user_id,
            token: Uuid::new_v4(),
            expires_at,
        };
        self.tables.sessions.push(session.clone());
        session
    }

    /// The next call of the given operation fails with [`StoreError::Injected`].
    #[cfg(feature = "test-support")]
    pub fn fail_at(&mut self, point: FailPoint) {
        self.fail_at = Some(point);
    }

    pub fn outbox(&self) -> &[NewOutbox] {
        &self.tables.outbox
    }

    pub fn orders(&self) -> &[Order] {
        &self.tables.orders
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.tables.order_items
    }

    pub fn cart_entries(&self, user_id: i32) -> Vec<CartEntry> {
        self.tables
            .carts
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    #[cfg(feature = "test-support")]
    fn trip(&mut self, operation: &'static str) -> StoreResult<()> {
        if self.fail_at.is_some_and(|point| point.name() == operation) {
            self.fail_at = None;
            return Err(StoreError::Injected(operation));
        }
        Ok(())
    }

    #[cfg(not(feature = "test-support"))]
    fn trip(&mut self, _operation: &'static str) -> StoreResult<()> {
        Ok(())
    }

    fn truck(&self, truck_id: i32) -> StoreResult<Truck> {
        self.tables
            .trucks
            .iter()
            .find(|truck| truck.id == truck_id)
            .cloned()
            .ok_or(StoreError::Query(diesel::result::Error::NotFound))
    }

    fn menu_item(&self, item_id: i32) -> StoreResult<MenuItem> {
        self.tables
            .menu_items
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
            .ok_or(StoreError::Query(diesel::result::Error::NotFound))
    }

    fn user(&self, user_id: i32) -> StoreResult<User> {
        self.tables
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or(StoreError::Query(diesel::result::Error::NotFound))
    }
}

fn not_found() -> StoreError {
    StoreError::Query(diesel::result::Error::NotFound)
}

impl OrderingStore for MemoryStore {
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.tables.clone();
        let result = f(self);
        if result.is_err() {
            self.tables = snapshot;
        }
        result
    }

    fn lock_cart(&mut self, _user_id: i32) -> StoreResult<()> {
        Ok(())
    }

    fn find_session(&mut self, token: Uuid) -> StoreResult<Option<(Session, User)>> {
        let Some(session) = self
            .tables
            .sessions
            .iter()
            .find(|session| session.token == token)
            .cloned()
        else {
            return Ok(None);
        };
        let user = self.user(session.user_id)?;
        Ok(Some((session, user)))
    }

    fn find_truck(&mut self, truck_id: i32) -> StoreResult<Option<Truck>> {
        Ok(self.truck(truck_id).ok())
    }

    fn find_truck_by_owner(&mut self, owner_id: i32) -> StoreResult<Option<Truck>> {
        Ok(self
            .tables
            .trucks
            .iter()
            .find(|truck| truck.owner_id == owner_id)
            .cloned())
    }

    fn find_truck_by_name(&mut self, name: &str) -> StoreResult<Option<Truck>> {
        Ok(self
            .tables
            .trucks
            .iter()
            .find(|truck| truck.name == name)
            .cloned())
    }

    fn list_visible_trucks(&mut self) -> StoreResult<Vec<Truck>> {
        let mut trucks: Vec<Truck> = self
            .tables
            .trucks
            .iter()
            .filter(|truck| truck.truck_status == Availability::Available)
            .cloned()
            .collect();
        trucks.sort_by_key(|truck| Reverse((truck.created_at, truck.id)));
        Ok(trucks)
    }

    fn insert_truck(&mut self, truck: &NewTruck) -> StoreResult<Truck> {
        if self.tables.trucks.iter().any(|t| t.name == truck.name) {
            return Err(StoreError::Conflict("trucks_name_key".to_string()));
        }
        if self.tables.trucks.iter().any(|t| t.owner_id == truck.owner_id) {
            return Err(StoreError::Conflict("trucks_owner_id_key".to_string()));
        }
        let created = Truck {
            id: self.tables.next_id(),
            name: truck.name.clone(),
            logo: truck.logo.clone(),
            owner_id: truck.owner_id,
            truck_status: truck.truck_status,
            order_status: truck.order_status,
            created_at: Utc::now(),
        };
        self.tables.trucks.push(created.clone());
        Ok(created)
    }

    fn update_truck(&mut self, truck_id: i32, changes: &TruckChanges) -> StoreResult<Truck> {
        if let Some(name) = &changes.name {
            if self
                .tables
                .trucks
                .iter()
                .any(|t| t.id != truck_id && &t.name == name)
            {
                return Err(StoreError::Conflict("trucks_name_key".to_string()));
            }
        }
        let truck = self
            .tables
            .trucks
            .iter_mut()
            .find(|truck| truck.id == truck_id)
            .ok_or_else(not_found)?;
        if let Some(name) = &changes.name {
            truck.name = name.clone();
        }
        if let Some(logo) = &changes.logo {
            truck.logo = logo.clone();
        }
        if let Some(status) = changes.truck_status {
            truck.truck_status = status;
        }
        if let Some(status) = changes.order_status {
            truck.order_status = status;
        }
        Ok(truck.clone())
    }

    fn find_menu_item(&mut self, item_id: i32) -> StoreResult<Option<(MenuItem, Truck)>> {
        let Ok(item) = self.menu_item(item_id) else {
            return Ok(None);
        };
        let truck = self.truck(item.truck_id)?;
        Ok(Some((item, truck)))
    }

    fn list_menu_items(
        &mut self,
        truck_id: i32,
        category: Option<&str>,
    ) -> StoreResult<Vec<MenuItem>> {
        let mut items: Vec<MenuItem> = self
            .tables
            .menu_items
            .iter()
            .filter(|item| item.truck_id == truck_id)
            .filter(|item| category.map_or(true, |category| item.category == category))
            .cloned()
            .collect();
        items.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(items)
    }

    fn insert_menu_item(&mut self, item: &NewMenuItem) -> StoreResult<MenuItem> {
        self.truck(item.truck_id)
            .map_err(|_| StoreError::Conflict("menu_items_truck_id_fkey".to_string()))?;
        let created = MenuItem {
            id: self.tables.next_id(),
            truck_id: item.truck_id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.clone(),
            category: item.category.clone(),
            status: item.status,
            created_at: Utc::now(),
        };
        self.tables.menu_items.push(created.clone());
        Ok(created)
    }

    fn update_menu_item(
        &mut self,
        item_id: i32,
        changes: &MenuItemChanges,
    ) -> StoreResult<MenuItem> {
        let item = self
            .tables
            .menu_items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(not_found)?;
        if let Some(name) = &changes.name {
            item.name = name.clone();
        }
        if let Some(description) = &changes.description {
            item.description = description.clone();
        }
        if let Some(price) = &changes.price {
            item.price = price.clone();
        }
        if let Some(category) = &changes.category {
            item.category = category.clone();
        }
        if let Some(status) = changes.status {
            item.status = status;
        }
        Ok(item.clone())
    }

    fn delete_menu_item(&mut self, item_id: i32) -> StoreResult<()> {
        if self
            .tables
            .order_items
            .iter()
            .any(|ordered| ordered.item_id == item_id)
        {
            return Err(StoreError::Conflict("order_items_item_id_fkey".to_string()));
        }
        self.tables.menu_items.retain(|item| item.id != item_id);
        self.tables.carts.retain(|entry| entry.item_id != item_id);
        Ok(())
    }

    fn find_cart_entry(&mut self, entry_id: i32) -> StoreResult<Option<CartEntry>> {
        Ok(self
            .tables
            .carts
            .iter()
            .find(|entry| entry.id == entry_id)
            .cloned())
    }

    fn find_cart_entry_for_item(
        &mut self,
        user_id: i32,
        item_id: i32,
    ) -> StoreResult<Option<CartEntry>> {
        Ok(self
            .tables
            .carts
            .iter()
            .find(|entry| entry.user_id == user_id && entry.item_id == item_id)
            .cloned())
    }

    fn cart_truck_id(&mut self, user_id: i32) -> StoreResult<Option<i32>> {
        let Some(entry) = self
            .tables
            .carts
            .iter()
            .find(|entry| entry.user_id == user_id)
        else {
            return Ok(None);
        };
        Ok(Some(self.menu_item(entry.item_id)?.truck_id))
    }

    fn cart_lines(&mut self, user_id: i32) -> StoreResult<Vec<CartLine>> {
        let mut entries = self.cart_entries(user_id);
        entries.sort_by_key(|entry| entry.id);
        entries
            .into_iter()
            .map(|entry| {
                let item = self.menu_item(entry.item_id)?;
                let truck = self.truck(item.truck_id)?;
                Ok(CartLine { entry, item, truck })
            })
            .collect()
    }

    fn insert_cart_entry(&mut self, entry: &NewCartEntry) -> StoreResult<CartEntry> {
        if self
            .tables
            .carts
            .iter()
            .any(|e| e.user_id == entry.user_id && e.item_id == entry.item_id)
        {
            return Err(StoreError::Conflict("carts_user_id_item_id_key".to_string()));
        }
        let created = CartEntry {
            id: self.tables.next_id(),
            user_id: entry.user_id,
            item_id: entry.item_id,
            quantity: entry.quantity,
            price: entry.price.clone(),
        };
        self.tables.carts.push(created.clone());
        Ok(created)
    }

    fn update_cart_entry(
        &mut self,
        entry_id: i32,
        quantity: i32,
        price: Option<&BigDecimal>,
    ) -> StoreResult<CartEntry> {
        let entry = self
            .tables
            .carts
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(not_found)?;
        entry.quantity = quantity;
        if let Some(price) = price {
            entry.price = price.clone();
        }
        Ok(entry.clone())
    }

    fn delete_cart_entry(&mut self, entry_id: i32) -> StoreResult<()> {
        self.tables.carts.retain(|entry| entry.id != entry_id);
        Ok(())
    }

    fn clear_cart(&mut self, user_id: i32) -> StoreResult<usize> {
        self.trip("clear_cart")?;
        let before = self.tables.carts.len();
        self.tables.carts.retain(|entry| entry.user_id != user_id);
        Ok(before - self.tables.carts.len())
    }

    fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
        self.trip("insert_order")?;
        let created = Order {
            id: self.tables.next_id(),
            user_id: order.user_id,
            truck_id: order.truck_id,
            order_status: order.order_status,
            total_price: order.total_price.clone(),
            scheduled_pickup_time: order.scheduled_pickup_time,
            estimated_earliest_pickup: order.estimated_earliest_pickup,
            created_at: order.created_at,
        };
        self.tables.orders.push(created.clone());
        Ok(created)
    }

    fn insert_order_items(&mut self, items: &[NewOrderItem]) -> StoreResult<Vec<OrderItem>> {
        self.trip("insert_order_items")?;
        let created: Vec<OrderItem> = items
            .iter()
            .map(|item| OrderItem {
                id: self.tables.next_id(),
                order_id: item.order_id,
                item_id: item.item_id,
                quantity: item.quantity,
                price: item.price.clone(),
            })
            .collect();
        self.tables.order_items.extend(created.iter().cloned());
        Ok(created)
    }

    fn lock_order(&mut self, _order_id: i32) -> StoreResult<()> {
        Ok(())
    }

    fn find_order(&mut self, order_id: i32) -> StoreResult<Option<(Order, Truck)>> {
        let Some(order) = self
            .tables
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
        else {
            return Ok(None);
        };
        let truck = self.truck(order.truck_id)?;
        Ok(Some((order, truck)))
    }

    fn order_lines(&mut self, order_id: i32) -> StoreResult<Vec<OrderLine>> {
        let mut items: Vec<OrderItem> = self
            .tables
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id);
        items
            .into_iter()
            .map(|item| {
                let menu_item = self.menu_item(item.item_id)?;
                Ok(OrderLine { item, menu_item })
            })
            .collect()
    }

    fn list_orders_for_customer(&mut self, user_id: i32) -> StoreResult<Vec<(Order, Truck)>> {
        let mut orders: Vec<Order> = self
            .tables
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| Reverse((order.created_at, order.id)));
        orders
            .into_iter()
            .map(|order| {
                let truck = self.truck(order.truck_id)?;
                Ok((order, truck))
            })
            .collect()
    }

    fn list_orders_for_truck(&mut self, truck_id: i32) -> StoreResult<Vec<(Order, User)>> {
        let mut orders: Vec<Order> = self
            .tables
            .orders
            .iter()
            .filter(|order| order.truck_id == truck_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| Reverse((order.created_at, order.id)));
        orders
            .into_iter()
            .map(|order| {
                let user = self.user(order.user_id)?;
                Ok((order, user))
            })
            .collect()
    }

    fn update_order_status(&mut self, order_id: i32, status: OrderStatus) -> StoreResult<Order> {
        let order = self
            .tables
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(not_found)?;
        order.order_status = status;
        Ok(order.clone())
    }

    fn append_outbox(&mut self, message: &NewOutbox) -> StoreResult<()> {
        self.trip("append_outbox")?;
        self.tables.outbox.push(message.clone());
        Ok(())
    }
}

#[cfg(all(test, feature = "test-support"))]
mod tests {
    use super::*;

    #[test]
    fn fail_point_trips_once() {
        let mut store = MemoryStore::new();
        let customer = store.add_user("Mona", UserRole::Customer);
        store.fail_at(FailPoint::ClearCart);

        assert!(matches!(
            store.clear_cart(customer.id),
            Err(StoreError::Injected("clear_cart"))
        ));
        assert_eq!(store.clear_cart(customer.id).unwrap(), 0);
    }

    #[test]
    fn other_operations_are_unaffected() {
        let mut store = MemoryStore::new();
        store.fail_at(FailPoint::AppendOutbox);

        assert!(store.clear_cart(1).is_ok());
        assert!(store.orders().is_empty());
    }
}
