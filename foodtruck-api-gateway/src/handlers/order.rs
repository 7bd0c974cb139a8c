use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use chrono::Utc;
use foodtruck_order_service::{checkout, orders, status};
use tracing::instrument;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::*;
use crate::session::CurrentUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order/new", post(place_order))
        .route("/order/myOrders", get(my_orders))
        .route("/order/details/{order_id}", get(order_details))
        .route("/order/truckOrders", get(truck_orders))
        .route("/order/updateStatus/{order_id}", put(update_order_status))
}

#[utoipa::path(
    post,
    path = "/api/v1/order/new",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed and cart cleared", body = PlaceOrderResponse),
        (status = 400, description = "Empty cart, unavailable items, truck closed, or pickup too soon", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a customer", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Option<JsonBody<PlaceOrderRequest>>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    let customer_id = user.require_customer()?;
    let JsonBody(payload) = payload.unwrap_or_default();

    let placed = state
        .database
        .run(move |conn| {
            checkout::place_order(
                conn,
                customer_id,
                payload.scheduled_pickup_time.as_deref(),
                Utc::now(),
            )
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            message: "Order placed successfully".to_string(),
            order: placed.order.into(),
            items: placed.lines.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/order/myOrders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = Vec<CustomerOrderResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a customer", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CustomerOrderResponse>>, ApiError> {
    let customer_id = user.require_customer()?;
    let orders = state
        .database
        .run(move |conn| orders::list_customer_orders(conn, customer_id))
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/order/details/{order_id}",
    responses(
        (status = 200, description = "Order with its items", body = OrderDetailsResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Neither the customer nor the truck's owner", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(("order_id" = i32, Path, description = "Order ID")),
    security(("session" = [])),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn order_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(order_id): PathParam<i32>,
) -> Result<Json<OrderDetailsResponse>, ApiError> {
    let details = state
        .database
        .run(move |conn| orders::order_details(conn, &user, order_id))
        .await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/order/truckOrders",
    responses(
        (status = 200, description = "Orders of the caller's truck, newest first", body = Vec<TruckOrderResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a truck owner", body = ApiErrorResponse),
        (status = 404, description = "Owner has no truck", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn truck_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TruckOrderResponse>>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let orders = state
        .database
        .run(move |conn| orders::list_truck_orders(conn, owner_id))
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/api/v1/order/updateStatus/{order_id}",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderMutationResponse),
        (status = 400, description = "Unknown status or disallowed transition", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Order belongs to another truck", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(("order_id" = i32, Path, description = "Order ID")),
    security(("session" = [])),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn update_order_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(order_id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> Result<Json<OrderMutationResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let policy = state.status_policy;
    let order = state
        .database
        .run(move |conn| {
            status::update_status(conn, owner_id, order_id, &payload.order_status, policy)
        })
        .await?;

    Ok(Json(OrderMutationResponse {
        message: "Order status updated successfully".to_string(),
        order: order.into(),
    }))
}
