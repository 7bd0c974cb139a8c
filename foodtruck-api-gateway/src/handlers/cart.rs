use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use foodtruck_order_service::cart::{self, CartAddition};
use tracing::instrument;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::*;
use crate::session::CurrentUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart/new", post(add_to_cart))
        .route("/cart/view", get(view_cart))
        .route("/cart/{cart_id}", put(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/new",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added to cart", body = CartMutationResponse),
        (status = 200, description = "Existing cart entry incremented", body = CartMutationResponse),
        (status = 400, description = "Invalid quantity, unavailable item, or item from another truck", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a customer", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartMutationResponse>), ApiError> {
    let customer_id = user.require_customer()?;
    let addition = state
        .database
        .run(move |conn| cart::add_item(conn, customer_id, payload.item_id, payload.quantity))
        .await?;

    let (status, message) = match &addition {
        CartAddition::Inserted(_) => (StatusCode::CREATED, "Item added to cart successfully"),
        CartAddition::Merged(_) => (StatusCode::OK, "Cart updated successfully"),
    };
    Ok((
        status,
        Json(CartMutationResponse {
            message: message.to_string(),
            cart_item: addition.into_entry().into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/cart/view",
    responses(
        (status = 200, description = "Cart entries with item and truck facts", body = CartResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a customer", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn view_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let customer_id = user.require_customer()?;
    let cart = state
        .database
        .run(move |conn| cart::view_cart(conn, customer_id))
        .await?;
    Ok(Json(cart.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/{cart_id}",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity changed", body = CartMutationResponse),
        (status = 400, description = "Invalid quantity", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Entry belongs to someone else", body = ApiErrorResponse),
        (status = 404, description = "Cart item not found", body = ApiErrorResponse),
    ),
    params(("cart_id" = i32, Path, description = "Cart entry ID")),
    security(("session" = [])),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(cart_id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateCartRequest>,
) -> Result<Json<CartMutationResponse>, ApiError> {
    let customer_id = user.require_customer()?;
    let entry = state
        .database
        .run(move |conn| cart::update_quantity(conn, customer_id, cart_id, payload.quantity))
        .await?;

    Ok(Json(CartMutationResponse {
        message: "Cart item updated successfully".to_string(),
        cart_item: entry.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/{cart_id}",
    responses(
        (status = 200, description = "Entry removed", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Entry belongs to someone else", body = ApiErrorResponse),
        (status = 404, description = "Cart item not found", body = ApiErrorResponse),
    ),
    params(("cart_id" = i32, Path, description = "Cart entry ID")),
    security(("session" = [])),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(cart_id): PathParam<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let customer_id = user.require_customer()?;
    state
        .database
        .run(move |conn| cart::remove_item(conn, customer_id, cart_id))
        .await?;

    Ok(Json(MessageResponse {
        message: "Item removed from cart successfully".to_string(),
    }))
}
