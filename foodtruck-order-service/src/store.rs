//! Datastore port used by the catalog, cart, checkout and status modules.
//!
//! Operations are synchronous; [`crate::Database`] moves Postgres work onto
//! the blocking pool. Every multi-statement mutation runs inside
//! [`OrderingStore::transaction`].

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    CartEntry, CartLine, MenuItem, MenuItemChanges, NewCartEntry, NewMenuItem, NewOrder,
    NewOrderItem, NewOutbox, NewTruck, Order, OrderItem, OrderLine, OrderStatus, Session, Truck,
    TruckChanges, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;

pub trait OrderingStore {
    /// Runs `f` atomically: either every write it made is kept, or none is.
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>;

    /// Serializes cart mutations of one customer until the surrounding
    /// transaction ends.
    fn lock_cart(&mut self, user_id: i32) -> StoreResult<()>;

    fn find_session(&mut self, token: Uuid) -> StoreResult<Option<(Session, User)>>;

    fn find_truck(&mut self, truck_id: i32) -> StoreResult<Option<Truck>>;
    fn find_truck_by_owner(&mut self, owner_id: i32) -> StoreResult<Option<Truck>>;
    fn find_truck_by_name(&mut self, name: &str) -> StoreResult<Option<Truck>>;
    /// Trucks customers may see, newest first.
    fn list_visible_trucks(&mut self) -> StoreResult<Vec<Truck>>;
    fn insert_truck(&mut self, truck: &NewTruck) -> StoreResult<Truck>;
    fn update_truck(&mut self, truck_id: i32, changes: &TruckChanges) -> StoreResult<Truck>;

    fn find_menu_item(&mut self, item_id: i32) -> StoreResult<Option<(MenuItem, Truck)>>;
    /// Items of a truck ordered by `(category, name)`.
    fn list_menu_items(
        &mut self,
        truck_id: i32,
        category: Option<&str>,
    ) -> StoreResult<Vec<MenuItem>>;
    fn insert_menu_item(&mut self, item: &NewMenuItem) -> StoreResult<MenuItem>;
    fn update_menu_item(
        &mut self,
        item_id: i32,
        changes: &MenuItemChanges,
    ) -> StoreResult<MenuItem>;
    fn delete_menu_item(&mut self, item_id: i32) -> StoreResult<()>;

    fn find_cart_entry(&mut self, entry_id: i32) -> StoreResult<Option<CartEntry>>;
    fn find_cart_entry_for_item(
        &mut self,
        user_id: i32,
        item_id: i32,
    ) -> StoreResult<Option<CartEntry>>;
    /// The truck the customer's cart currently belongs to, if any.
    fn cart_truck_id(&mut self, user_id: i32) -> StoreResult<Option<i32>>;
    /// The customer's cart, ordered by entry id.
    fn cart_lines(&mut self, user_id: i32) -> StoreResult<Vec<CartLine>>;
    fn insert_cart_entry(&mut self, entry: &NewCartEntry) -> StoreResult<CartEntry>;
    fn update_cart_entry(
        &mut self,
        entry_id: i32,
        quantity: i32,
        price: Option<&BigDecimal>,
    ) -> StoreResult<CartEntry>;
    fn delete_cart_entry(&mut self, entry_id: i32) -> StoreResult<()>;
    fn clear_cart(&mut self, user_id: i32) -> StoreResult<usize>;

    fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order>;
    fn insert_order_items(&mut self, items: &[NewOrderItem]) -> StoreResult<Vec<OrderItem>>;
    /// Holds the order row until the surrounding transaction ends.
    fn lock_order(&mut self, order_id: i32) -> StoreResult<()>;
    fn find_order(&mut self, order_id: i32) -> StoreResult<Option<(Order, Truck)>>;
    fn order_lines(&mut self, order_id: i32) -> StoreResult<Vec<OrderLine>>;
    /// Newest first.
    fn list_orders_for_customer(&mut self, user_id: i32) -> StoreResult<Vec<(Order, Truck)>>;
    /// Newest first.
    fn list_orders_for_truck(&mut self, truck_id: i32) -> StoreResult<Vec<(Order, User)>>;
    fn update_order_status(&mut self, order_id: i32, status: OrderStatus) -> StoreResult<Order>;

    fn append_outbox(&mut self, message: &NewOutbox) -> StoreResult<()>;
}
