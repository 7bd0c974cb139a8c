use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use foodtruck_order_service::catalog::{self, MenuItemDraft};
use foodtruck_order_service::models::MenuItemChanges;
use tracing::instrument;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::*;
use crate::session::CurrentUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menuItem/new", post(add_menu_item))
        .route("/menuItem/view", get(list_my_menu))
        .route("/menuItem/view/{item_id}", get(get_my_menu_item))
        .route("/menuItem/edit/{item_id}", put(update_menu_item))
        .route("/menuItem/delete/{item_id}", delete(delete_menu_item))
        .route("/menuItem/truck/{truck_id}", get(get_truck_menu))
        .route(
            "/menuItem/truck/{truck_id}/category/{category}",
            get(get_truck_menu_by_category),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/menuItem/new",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item added", body = MenuItemMutationResponse),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a truck owner", body = ApiErrorResponse),
        (status = 404, description = "Owner has no truck", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn add_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemMutationResponse>), ApiError> {
    let owner_id = user.require_truck_owner()?;
    let draft = MenuItemDraft {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        category: payload.category,
        status: parse_availability(payload.status)?,
    };

    let item = state
        .database
        .run(move |conn| catalog::add_menu_item(conn, owner_id, draft))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MenuItemMutationResponse {
            message: "Menu item added successfully".to_string(),
            menu_item: item.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/menuItem/view",
    responses(
        (status = 200, description = "The caller's menu", body = Vec<MenuItemResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a truck owner", body = ApiErrorResponse),
        (status = 404, description = "Owner has no truck", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_my_menu(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let items = state
        .database
        .run(move |conn| catalog::list_own_menu(conn, owner_id))
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/menuItem/view/{item_id}",
    responses(
        (status = 200, description = "Menu item", body = MenuItemResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Item belongs to another truck", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(("item_id" = i32, Path, description = "Menu item ID")),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_my_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(item_id): PathParam<i32>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let item = state
        .database
        .run(move |conn| catalog::find_own_menu_item(conn, owner_id, item_id))
        .await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/menuItem/edit/{item_id}",
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemMutationResponse),
        (status = 400, description = "Invalid price or no fields", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Item belongs to another truck", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(("item_id" = i32, Path, description = "Menu item ID")),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(item_id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemMutationResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let changes = MenuItemChanges {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        category: payload.category,
        status: parse_availability(payload.status)?,
    };

    let item = state
        .database
        .run(move |conn| catalog::update_menu_item(conn, owner_id, item_id, changes))
        .await?;

    Ok(Json(MenuItemMutationResponse {
        message: "Menu item updated successfully".to_string(),
        menu_item: item.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menuItem/delete/{item_id}",
    responses(
        (status = 200, description = "Menu item deleted", body = MessageResponse),
        (status = 400, description = "Item is part of existing orders", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Item belongs to another truck", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(("item_id" = i32, Path, description = "Menu item ID")),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(item_id): PathParam<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    state
        .database
        .run(move |conn| catalog::delete_menu_item(conn, owner_id, item_id))
        .await?;

    Ok(Json(MessageResponse {
        message: "Menu item deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/menuItem/truck/{truck_id}",
    responses(
        (status = 200, description = "Menu ordered by category and name", body = Vec<MenuItemResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Truck not found", body = ApiErrorResponse),
    ),
    params(("truck_id" = i32, Path, description = "Truck ID")),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_truck_menu(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    PathParam(truck_id): PathParam<i32>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    menu_of(state, truck_id, None).await
}

#[utoipa::path(
    get,
    path = "/api/v1/menuItem/truck/{truck_id}/category/{category}",
    responses(
        (status = 200, description = "Menu items of one category", body = Vec<MenuItemResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Truck not found", body = ApiErrorResponse),
    ),
    params(
        ("truck_id" = i32, Path, description = "Truck ID"),
        ("category" = String, Path, description = "Category name"),
    ),
    security(("session" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_truck_menu_by_category(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    PathParam((truck_id, category)): PathParam<(i32, String)>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    menu_of(state, truck_id, Some(category)).await
}

async fn menu_of(
    state: AppState,
    truck_id: i32,
    category: Option<String>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let items = state
        .database
        .run(move |conn| catalog::list_menu_items(conn, truck_id, category.as_deref()))
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}
