use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use foodtruck_order_service::cart::CartView;
use foodtruck_order_service::models::{
    Availability, CartEntry, CartLine, MenuItem, Order, OrderLine, Truck, User,
};
use foodtruck_order_service::orders::OrderDetails;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Keeps an explicit `null` apart from a missing field: missing is `None`,
/// `null` is `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn parse_availability(value: Option<String>) -> Result<Option<Availability>, ApiError> {
    value
        .map(|value| {
            value.parse::<Availability>().map_err(|_| {
                ApiError::invalid_input("Status must be either 'available' or 'unavailable'")
            })
        })
        .transpose()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TruckResponse {
    pub truck_id: i32,
    pub truck_name: String,
    pub truck_logo: Option<String>,
    pub owner_id: i32,
    #[schema(value_type = String, example = "available")]
    pub truck_status: Availability,
    #[schema(value_type = String, example = "available")]
    pub order_status: Availability,
    pub created_at: DateTime<Utc>,
}

impl From<Truck> for TruckResponse {
    fn from(truck: Truck) -> Self {
        Self {
            truck_id: truck.id,
            truck_name: truck.name,
            truck_logo: truck.logo,
            owner_id: truck.owner_id,
            truck_status: truck.truck_status,
            order_status: truck.order_status,
            created_at: truck.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTruckRequest {
    pub truck_name: String,
    pub truck_logo: Option<String>,
    /// `available` or `unavailable`; defaults to `available`
    pub truck_status: Option<String>,
    /// `available` or `unavailable`; defaults to `available`
    pub order_status: Option<String>,
}

/// Only the supplied fields change. `truckLogo: null` removes the logo.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTruckRequest {
    pub truck_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub truck_logo: Option<Option<String>>,
    pub truck_status: Option<String>,
    pub order_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TruckMutationResponse {
    pub message: String,
    pub truck: TruckResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemResponse {
    pub item_id: i32,
    pub truck_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "6.50")]
    pub price: BigDecimal,
    pub category: String,
    #[schema(value_type = String, example = "available")]
    pub status: Availability,
    pub created_at: DateTime<Utc>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            item_id: item.id,
            truck_id: item.truck_id,
            name: item.name,
            description: item.description,
            price: item.price,
            category: item.category,
            status: item.status,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "6.50")]
    pub price: BigDecimal,
    pub category: String,
    pub status: Option<String>,
}

/// Only the supplied fields change. `description: null` clears it.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<String>, example = "7.00")]
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemMutationResponse {
    pub message: String,
    pub menu_item: MenuItemResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartEntryResponse {
    pub cart_id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    #[schema(value_type = String, example = "6.50")]
    pub price: BigDecimal,
}

impl From<CartEntry> for CartEntryResponse {
    fn from(entry: CartEntry) -> Self {
        Self {
            cart_id: entry.id,
            user_id: entry.user_id,
            item_id: entry.item_id,
            quantity: entry.quantity,
            price: entry.price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub cart_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    /// Price captured when the item was added
    #[schema(value_type = String, example = "6.50")]
    pub price: BigDecimal,
    pub item_name: String,
    pub description: Option<String>,
    pub category: String,
    #[schema(value_type = String, example = "available")]
    pub item_status: Availability,
    pub truck_id: i32,
    pub truck_name: String,
    pub truck_logo: Option<String>,
    #[schema(value_type = String, example = "available")]
    pub order_status: Availability,
}

impl From<CartLine> for CartLineResponse {
    fn from(CartLine { entry, item, truck }: CartLine) -> Self {
        Self {
            cart_id: entry.id,
            item_id: entry.item_id,
            quantity: entry.quantity,
            price: entry.price,
            item_name: item.name,
            description: item.description,
            category: item.category,
            item_status: item.status,
            truck_id: truck.id,
            truck_name: truck.name,
            truck_logo: truck.logo,
            order_status: truck.order_status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_items: Vec<CartLineResponse>,
    #[schema(value_type = String, example = "16.50")]
    pub total: BigDecimal,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            cart_items: cart.lines.into_iter().map(Into::into).collect(),
            total: cart.total,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub item_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationResponse {
    pub message: String,
    pub cart_item: CartEntryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    #[schema(value_type = String, example = "pending")]
    pub order_status: foodtruck_order_service::models::OrderStatus,
    #[schema(value_type = String, example = "35.00")]
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            truck_id: order.truck_id,
            order_status: order.order_status,
            total_price: order.total_price,
            scheduled_pickup_time: order.scheduled_pickup_time,
            estimated_earliest_pickup: order.estimated_earliest_pickup,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub order_item_id: i32,
    pub item_id: i32,
    pub item_name: String,
    pub category: String,
    pub quantity: i32,
    /// Price frozen at checkout
    #[schema(value_type = String, example = "10.00")]
    pub price: BigDecimal,
}

impl From<OrderLine> for OrderItemResponse {
    fn from(OrderLine { item, menu_item }: OrderLine) -> Self {
        Self {
            order_item_id: item.id,
            item_id: item.item_id,
            item_name: menu_item.name,
            category: menu_item.category,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC; at least 30 minutes ahead
    pub scheduled_pickup_time: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub message: String,
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub truck_name: String,
    pub truck_logo: Option<String>,
}

impl From<(Order, Truck)> for CustomerOrderResponse {
    fn from((order, truck): (Order, Truck)) -> Self {
        Self {
            order: order.into(),
            truck_name: truck.name,
            truck_logo: truck.logo,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TruckOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub customer_name: String,
    pub customer_email: String,
}

impl From<(Order, User)> for TruckOrderResponse {
    fn from((order, customer): (Order, User)) -> Self {
        Self {
            order: order.into(),
            customer_name: customer.name,
            customer_email: customer.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub truck_name: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(details: OrderDetails) -> Self {
        Self {
            order: details.order.into(),
            truck_name: details.truck.name,
            items: details.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    /// One of `pending`, `preparing`, `ready`, `completed`, `cancelled`
    pub order_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderMutationResponse {
    pub message: String,
    pub order: OrderResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_fields_differ() {
        let absent: UpdateTruckRequest = serde_json::from_str(r#"{"truckName":"Grill"}"#).unwrap();
        assert_eq!(absent.truck_logo, None);

        let cleared: UpdateTruckRequest = serde_json::from_str(r#"{"truckLogo":null}"#).unwrap();
        assert_eq!(cleared.truck_logo, Some(None));

        let set: UpdateMenuItemRequest =
            serde_json::from_str(r#"{"description":"Spicy","price":"7.5"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Spicy".to_string())));
        assert_eq!(set.price, Some("7.5".parse().unwrap()));
    }

    #[test]
    fn unknown_availability_is_invalid_input() {
        assert!(parse_availability(Some("closed".to_string())).is_err());
        assert_eq!(
            parse_availability(Some("unavailable".to_string())).unwrap(),
            Some(Availability::Unavailable)
        );
        assert_eq!(parse_availability(None).unwrap(), None);
    }
}
