use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use foodtruck_order_service::catalog::{self, TruckDraft};
use foodtruck_order_service::models::TruckChanges;
use tracing::instrument;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::*;
use crate::session::CurrentUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trucks/view", get(list_trucks))
        .route("/trucks/myTruck", get(get_my_truck))
        .route("/trucks/new", post(create_truck))
        .route("/trucks/{truck_id}", get(get_truck).put(update_truck))
}

#[utoipa::path(
    get,
    path = "/api/v1/trucks/view",
    responses(
        (status = 200, description = "Trucks visible to customers, newest first", body = Vec<TruckResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "trucks"
)]
#[instrument(skip(state))]
pub async fn list_trucks(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<TruckResponse>>, ApiError> {
    let trucks = state
        .database
        .run(|conn| catalog::list_visible_trucks(conn))
        .await?;
    Ok(Json(trucks.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/trucks/myTruck",
    responses(
        (status = 200, description = "The caller's truck", body = TruckResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a truck owner", body = ApiErrorResponse),
        (status = 404, description = "Owner has no truck", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "trucks"
)]
#[instrument(skip(state))]
pub async fn get_my_truck(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<TruckResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let truck = state
        .database
        .run(move |conn| catalog::find_owned_truck(conn, owner_id))
        .await?;
    Ok(Json(truck.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/trucks/new",
    request_body = CreateTruckRequest,
    responses(
        (status = 201, description = "Truck created", body = TruckMutationResponse),
        (status = 400, description = "Invalid input, name taken, or owner already has a truck", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a truck owner", body = ApiErrorResponse),
    ),
    security(("session" = [])),
    tag = "trucks"
)]
#[instrument(skip(state))]
pub async fn create_truck(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateTruckRequest>,
) -> Result<(StatusCode, Json<TruckMutationResponse>), ApiError> {
    let owner_id = user.require_truck_owner()?;
    let draft = TruckDraft {
        name: payload.truck_name,
        logo: payload.truck_logo,
        truck_status: parse_availability(payload.truck_status)?,
        order_status: parse_availability(payload.order_status)?,
    };

    let truck = state
        .database
        .run(move |conn| catalog::create_truck(conn, owner_id, draft))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TruckMutationResponse {
            message: "Truck created successfully".to_string(),
            truck: truck.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/trucks/{truck_id}",
    responses(
        (status = 200, description = "Truck", body = TruckResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Truck not found", body = ApiErrorResponse),
    ),
    params(("truck_id" = i32, Path, description = "Truck ID")),
    security(("session" = [])),
    tag = "trucks"
)]
#[instrument(skip(state))]
pub async fn get_truck(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    PathParam(truck_id): PathParam<i32>,
) -> Result<Json<TruckResponse>, ApiError> {
    let truck = state
        .database
        .run(move |conn| catalog::find_truck(conn, truck_id))
        .await?;
    Ok(Json(truck.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/trucks/{truck_id}",
    request_body = UpdateTruckRequest,
    responses(
        (status = 200, description = "Truck updated", body = TruckMutationResponse),
        (status = 400, description = "No fields, or name taken", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not this truck's owner", body = ApiErrorResponse),
        (status = 404, description = "Truck not found", body = ApiErrorResponse),
    ),
    params(("truck_id" = i32, Path, description = "Truck ID")),
    security(("session" = [])),
    tag = "trucks"
)]
#[instrument(skip(state))]
pub async fn update_truck(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(truck_id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateTruckRequest>,
) -> Result<Json<TruckMutationResponse>, ApiError> {
    let owner_id = user.require_truck_owner()?;
    let changes = TruckChanges {
        name: payload.truck_name,
        logo: payload.truck_logo,
        truck_status: parse_availability(payload.truck_status)?,
        order_status: parse_availability(payload.order_status)?,
    };

    let truck = state
        .database
        .run(move |conn| catalog::update_truck(conn, owner_id, truck_id, changes))
        .await?;

    Ok(Json(TruckMutationResponse {
        message: "Truck updated successfully".to_string(),
        truck: truck.into(),
    }))
}
