use std::fmt;
use std::io::Write;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{carts, menu_items, order_items, orders, outbox, sessions, trucks, users};

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::Availability)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        *self == Availability::Available
    }
}

impl FromStr for Availability {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Availability::Available),
            "unavailable" => Ok(Availability::Unavailable),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl ToSql<crate::schema::sql_types::Availability, Pg> for Availability {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::Availability, Pg> for Availability {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"available" => Ok(Availability::Available),
            b"unavailable" => Ok(Availability::Unavailable),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

/// Lifecycle of a placed order. `Completed` and `Cancelled` are terminal.
#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::OrderStatus)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether `next` follows `self` in `pending → preparing → ready → completed`,
    /// or cancels a non-terminal order.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (current, OrderStatus::Cancelled) => !current.is_terminal(),
            (OrderStatus::Pending, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Ready, OrderStatus::Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl ToSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"pending" => Ok(OrderStatus::Pending),
            b"preparing" => Ok(OrderStatus::Preparing),
            b"ready" => Ok(OrderStatus::Ready),
            b"completed" => Ok(OrderStatus::Completed),
            b"cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::UserRole)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Customer,
    TruckOwner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::TruckOwner => "truckOwner",
        }
    }
}

impl ToSql<crate::schema::sql_types::UserRole, Pg> for UserRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::UserRole, Pg> for UserRole {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"customer" => Ok(UserRole::Customer),
            b"truckOwner" => Ok(UserRole::TruckOwner),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unrecognized value `{0}`")]
pub struct UnknownVariant(pub String);

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = trucks)]
pub struct Truck {
    pub id: i32,
    pub name: String,
    pub logo: Option<String>,
    pub owner_id: i32,
    pub truck_status: Availability,
    pub order_status: Availability,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = trucks)]
pub struct NewTruck {
    pub name: String,
    pub logo: Option<String>,
    pub owner_id: i32,
    pub truck_status: Availability,
    pub order_status: Availability,
}

/// Partial update of a truck. `None` leaves a column untouched; for the
/// nullable logo, `Some(None)` clears it.
#[derive(AsChangeset, Default, Clone, Debug, PartialEq)]
#[diesel(table_name = trucks)]
pub struct TruckChanges {
    pub name: Option<String>,
    pub logo: Option<Option<String>>,
    pub truck_status: Option<Availability>,
    pub order_status: Option<Availability>,
}

impl TruckChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo.is_none()
            && self.truck_status.is_none()
            && self.order_status.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Truck))]
#[diesel(table_name = menu_items)]
pub struct MenuItem {
    pub id: i32,
    pub truck_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category: String,
    pub status: Availability,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItem {
    pub truck_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category: String,
    pub status: Availability,
}

#[derive(AsChangeset, Default, Clone, Debug, PartialEq)]
#[diesel(table_name = menu_items)]
pub struct MenuItemChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub status: Option<Availability>,
}

impl MenuItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = carts)]
pub struct CartEntry {
    pub id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = carts)]
pub struct NewCartEntry {
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: OrderStatus,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: OrderStatus,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_items)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Queryable, Selectable, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct Outbox {
    pub id: i32,
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct NewOutbox {
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}

/// A cart entry joined with the item and truck it refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct CartLine {
    pub entry: CartEntry,
    pub item: MenuItem,
    pub truck: Truck,
}

/// An order item joined with the menu item's display facts.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderLine {
    pub item: OrderItem,
    pub menu_item: MenuItem,
}

/// Rounds an amount to cents, half away from zero, as stored in `NUMERIC(10,2)`.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, bigdecimal::RoundingMode::HalfUp)
}

/// Whether a rounded amount fits `NUMERIC(10,2)`, i.e. stays below 10^8.
pub fn fits_money_column(amount: &BigDecimal) -> bool {
    amount.abs() < BigDecimal::from(100_000_000)
}
