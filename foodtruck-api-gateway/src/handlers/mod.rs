pub mod cart;
pub mod menu;
pub mod order;
pub mod truck;

use axum::{Router, response::Json, routing::get};
use foodtruck_order_service::Database;
use foodtruck_order_service::status::StatusPolicy;
use utoipa::OpenApi;

use crate::models::*;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub status_policy: StatusPolicy,
}

/// Every API route, mounted under `/api/v1`.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .route("/health", get(health))
        .merge(truck::router())
        .merge(menu::router())
        .merge(cart::router())
        .merge(order::router());

    Router::new().nest("/api/v1", api)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        truck::list_trucks,
        truck::get_my_truck,
        truck::create_truck,
        truck::get_truck,
        truck::update_truck,
        menu::add_menu_item,
        menu::list_my_menu,
        menu::get_my_menu_item,
        menu::update_menu_item,
        menu::delete_menu_item,
        menu::get_truck_menu,
        menu::get_truck_menu_by_category,
        cart::add_to_cart,
        cart::view_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        order::place_order,
        order::my_orders,
        order::order_details,
        order::truck_orders,
        order::update_order_status,
    ),
    components(
        schemas(
            ApiErrorResponse,
            MessageResponse,
            HealthResponse,
            TruckResponse,
            CreateTruckRequest,
            UpdateTruckRequest,
            TruckMutationResponse,
            MenuItemResponse,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            MenuItemMutationResponse,
            CartEntryResponse,
            CartLineResponse,
            CartResponse,
            AddToCartRequest,
            UpdateCartRequest,
            CartMutationResponse,
            OrderResponse,
            OrderItemResponse,
            PlaceOrderRequest,
            PlaceOrderResponse,
            CustomerOrderResponse,
            TruckOrderResponse,
            OrderDetailsResponse,
            UpdateOrderStatusRequest,
            OrderMutationResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "trucks", description = "Food trucks"),
        (name = "menu", description = "Menu items"),
        (name = "cart", description = "Customer cart"),
        (name = "orders", description = "Orders and their lifecycle")
    ),
    info(
        title = "Food Truck API",
        description = "Ordering backend for food trucks",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session_token"))),
            );
        }
    }
}
