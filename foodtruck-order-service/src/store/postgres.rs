use std::sync::Arc;

use bigdecimal::BigDecimal;
use diesel::sql_types::BigInt;
use diesel::{delete, insert_into, prelude::*, update, PgConnection};
use uuid::Uuid;

use crate::error::{OrderingError, StoreError, StoreResult};
use crate::models::{
    Availability, CartEntry, CartLine, MenuItem, MenuItemChanges, NewCartEntry, NewMenuItem,
    NewOrder, NewOrderItem, NewOutbox, NewTruck, Order, OrderItem, OrderLine, OrderStatus,
    Session, Truck, TruckChanges, User,
};
use crate::schema::{carts, menu_items, order_items, orders, outbox, sessions, trucks, users};
use crate::store::OrderingStore;

/// Opens a fresh connection per unit of work and runs it on tokio's blocking pool.
#[derive(Clone)]
pub struct Database {
    url: Arc<str>,
}

impl Database {
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self { url: url.into() }
    }

    pub fn connect(&self) -> StoreResult<PgConnection> {
        Ok(PgConnection::establish(&self.url)?)
    }

    pub async fn run<T, F>(&self, work: F) -> Result<T, OrderingError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, OrderingError> + Send + 'static,
        T: Send + 'static,
    {
        let database = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = &mut database.connect()?;
            work(conn)
        })
        .await
        .map_err(|err| OrderingError::Internal(StoreError::Worker(err.to_string())))?
    }
}

enum TransactionError<E> {
    Aborted(E),
    Database(diesel::result::Error),
}

impl<E> From<diesel::result::Error> for TransactionError<E> {
    fn from(err: diesel::result::Error) -> Self {
        TransactionError::Database(err)
    }
}

impl OrderingStore for PgConnection {
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        Connection::transaction::<T, TransactionError<E>, _>(self, |conn| {
            f(conn).map_err(TransactionError::Aborted)
        })
        .map_err(|err| match err {
            TransactionError::Aborted(err) => err,
            TransactionError::Database(err) => E::from(StoreError::from(err)),
        })
    }

    fn lock_cart(&mut self, user_id: i32) -> StoreResult<()> {
        diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
            .bind::<BigInt, _>(i64::from(user_id))
            .execute(self)?;
        carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::id)
            .for_update()
            .load::<i32>(self)?;
        Ok(())
    }

    fn find_session(&mut self, token: Uuid) -> StoreResult<Option<(Session, User)>> {
        Ok(sessions::table
            .inner_join(users::table)
            .filter(sessions::token.eq(token))
            .select((Session::as_select(), User::as_select()))
            .first::<(Session, User)>(self)
            .optional()?)
    }

    fn find_truck(&mut self, truck_id: i32) -> StoreResult<Option<Truck>> {
        Ok(trucks::table
            .find(truck_id)
            .select(Truck::as_select())
            .first(self)
            .optional()?)
    }

    fn find_truck_by_owner(&mut self, owner_id: i32) -> StoreResult<Option<Truck>> {
        Ok(trucks::table
            .filter(trucks::owner_id.eq(owner_id))
            .select(Truck::as_select())
            .first(self)
            .optional()?)
    }

    fn find_truck_by_name(&mut self, name: &str) -> StoreResult<Option<Truck>> {
        Ok(trucks::table
            .filter(trucks::name.eq(name))
            .select(Truck::as_select())
            .first(self)
            .optional()?)
    }

    fn list_visible_trucks(&mut self) -> StoreResult<Vec<Truck>> {
        Ok(trucks::table
            .filter(trucks::truck_status.eq(Availability::Available))
            .order((trucks::created_at.desc(), trucks::id.desc()))
            .select(Truck::as_select())
            .load(self)?)
    }

    fn insert_truck(&mut self, truck: &NewTruck) -> StoreResult<Truck> {
        Ok(insert_into(trucks::table)
            .values(truck)
            .returning(Truck::as_returning())
            .get_result(self)?)
    }

    fn update_truck(&mut self, truck_id: i32, changes: &TruckChanges) -> StoreResult<Truck> {
        Ok(update(trucks::table.find(truck_id))
            .set(changes)
            .returning(Truck::as_returning())
            .get_result(self)?)
    }

    fn find_menu_item(&mut self, item_id: i32) -> StoreResult<Option<(MenuItem, Truck)>> {
        Ok(menu_items::table
            .inner_join(trucks::table)
            .filter(menu_items::id.eq(item_id))
            .select((MenuItem::as_select(), Truck::as_select()))
            .first::<(MenuItem, Truck)>(self)
            .optional()?)
    }

    fn list_menu_items(
        &mut self,
        truck_id: i32,
        category: Option<&str>,
    ) -> StoreResult<Vec<MenuItem>> {
        let mut query = menu_items::table
            .filter(menu_items::truck_id.eq(truck_id))
            .select(MenuItem::as_select())
            .into_boxed();
        if let Some(category) = category {
            query = query.filter(menu_items::category.eq(category));
        }
        Ok(query
            .order((menu_items::category.asc(), menu_items::name.asc()))
            .load(self)?)
    }

    fn insert_menu_item(&mut self, item: &NewMenuItem) -> StoreResult<MenuItem> {
        Ok(insert_into(menu_items::table)
            .values(item)
            .returning(MenuItem::as_returning())
            .get_result(self)?)
    }

    fn update_menu_item(
        &mut self,
        item_id: i32,
        changes: &MenuItemChanges,
    ) -> StoreResult<MenuItem> {
        Ok(update(menu_items::table.find(item_id))
            .set(changes)
            .returning(MenuItem::as_returning())
            .get_result(self)?)
    }

    fn delete_menu_item(&mut self, item_id: i32) -> StoreResult<()> {
        delete(menu_items::table.find(item_id)).execute(self)?;
        Ok(())
    }

    fn find_cart_entry(&mut self, entry_id: i32) -> StoreResult<Option<CartEntry>> {
        Ok(carts::table
            .find(entry_id)
            .select(CartEntry::as_select())
            .first(self)
            .optional()?)
    }

    fn find_cart_entry_for_item(
        &mut self,
        user_id: i32,
        item_id: i32,
    ) -> StoreResult<Option<CartEntry>> {
        Ok(carts::table
            .filter(carts::user_id.eq(user_id))
            .filter(carts::item_id.eq(item_id))
            .select(CartEntry::as_select())
            .first(self)
            .optional()?)
    }

    fn cart_truck_id(&mut self, user_id: i32) -> StoreResult<Option<i32>> {
        Ok(carts::table
            .inner_join(menu_items::table)
            .filter(carts::user_id.eq(user_id))
            .select(menu_items::truck_id)
            .first::<i32>(self)
            .optional()?)
    }

    fn cart_lines(&mut self, user_id: i32) -> StoreResult<Vec<CartLine>> {
        let rows = carts::table
            .inner_join(menu_items::table.inner_join(trucks::table))
            .filter(carts::user_id.eq(user_id))
            .order(carts::id.asc())
            .select((
                CartEntry::as_select(),
                MenuItem::as_select(),
                Truck::as_select(),
            ))
            .load::<(CartEntry, MenuItem, Truck)>(self)?;
        Ok(rows
            .into_iter()
            .map(|(entry, item, truck)| CartLine { entry, item, truck })
            .collect())
    }

    fn insert_cart_entry(&mut self, entry: &NewCartEntry) -> StoreResult<CartEntry> {
        Ok(insert_into(carts::table)
            .values(entry)
            .returning(CartEntry::as_returning())
            .get_result(self)?)
    }

    fn update_cart_entry(
        &mut self,
        entry_id: i32,
        quantity: i32,
        price: Option<&BigDecimal>,
    ) -> StoreResult<CartEntry> {
        let target = carts::table.find(entry_id);
        let entry = match price {
            Some(price) => update(target)
                .set((carts::quantity.eq(quantity), carts::price.eq(price)))
                .returning(CartEntry::as_returning())
                .get_result(self)?,
            None => update(target)
                .set(carts::quantity.eq(quantity))
                .returning(CartEntry::as_returning())
                .get_result(self)?,
        };
        Ok(entry)
    }

    fn delete_cart_entry(&mut self, entry_id: i32) -> StoreResult<()> {
        delete(carts::table.find(entry_id)).execute(self)?;
        Ok(())
    }

    fn clear_cart(&mut self, user_id: i32) -> StoreResult<usize> {
        Ok(delete(carts::table.filter(carts::user_id.eq(user_id))).execute(self)?)
    }

    fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
        Ok(insert_into(orders::table)
            .values(order)
            .returning(Order::as_returning())
            .get_result(self)?)
    }

    fn insert_order_items(&mut self, items: &[NewOrderItem]) -> StoreResult<Vec<OrderItem>> {
        Ok(insert_into(order_items::table)
            .values(items)
            .returning(OrderItem::as_returning())
            .get_results(self)?)
    }

    fn lock_order(&mut self, order_id: i32) -> StoreResult<()> {
        orders::table
            .find(order_id)
            .select(orders::id)
            .for_update()
            .first::<i32>(self)
            .optional()?;
        Ok(())
    }

    fn find_order(&mut self, order_id: i32) -> StoreResult<Option<(Order, Truck)>> {
        Ok(orders::table
            .inner_join(trucks::table)
            .filter(orders::id.eq(order_id))
            .select((Order::as_select(), Truck::as_select()))
            .first::<(Order, Truck)>(self)
            .optional()?)
    }

    fn order_lines(&mut self, order_id: i32) -> StoreResult<Vec<OrderLine>> {
        let rows = order_items::table
            .inner_join(menu_items::table)
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::id.asc())
            .select((OrderItem::as_select(), MenuItem::as_select()))
            .load::<(OrderItem, MenuItem)>(self)?;
        Ok(rows
            .into_iter()
            .map(|(item, menu_item)| OrderLine { item, menu_item })
            .collect())
    }

    fn list_orders_for_customer(&mut self, user_id: i32) -> StoreResult<Vec<(Order, Truck)>> {
        Ok(orders::table
            .inner_join(trucks::table)
            .filter(orders::user_id.eq(user_id))
            .order((orders::created_at.desc(), orders::id.desc()))
            .select((Order::as_select(), Truck::as_select()))
            .load(self)?)
    }

    fn list_orders_for_truck(&mut self, truck_id: i32) -> StoreResult<Vec<(Order, User)>> {
        Ok(orders::table
            .inner_join(users::table)
            .filter(orders::truck_id.eq(truck_id))
            .order((orders::created_at.desc(), orders::id.desc()))
            .select((Order::as_select(), User::as_select()))
            .load(self)?)
    }

    fn update_order_status(&mut self, order_id: i32, status: OrderStatus) -> StoreResult<Order> {
        Ok(update(orders::table.find(order_id))
            .set(orders::order_status.eq(status))
            .returning(Order::as_returning())
            .get_result(self)?)
    }

    fn append_outbox(&mut self, message: &NewOutbox) -> StoreResult<()> {
        insert_into(outbox::table).values(message).execute(self)?;
        Ok(())
    }
}
