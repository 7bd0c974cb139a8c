//! Request extractors whose rejections answer with the `{"error": ...}` body
//! every other failure uses, instead of axum's plain-text 4xx.

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body. Malformed or mistyped bodies are `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = <axum::Json<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// A request without `Content-Type` carries no body.
impl<T, S> OptionalFromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body: Option<axum::Json<T>> =
            <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|axum::Json(value)| JsonBody(value)))
    }
}

/// Typed path segments. Unparsable ids are `400 Bad Request`.
#[derive(Debug, Clone, Copy)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = <Path<T> as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        Ok(PathParam(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{self, StatusCode};
    use axum::response::Response;
    use axum::routing::{post, put};
    use axum::{Json, Router};
    use rstest::rstest;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::models::{AddToCartRequest, PlaceOrderRequest, UpdateCartRequest};

    fn cart_routes() -> Router {
        Router::new()
            .route(
                "/cart/new",
                post(|JsonBody(body): JsonBody<AddToCartRequest>| async move {
                    Json(serde_json::json!({ "itemId": body.item_id, "quantity": body.quantity }))
                }),
            )
            .route(
                "/cart/{cart_id}",
                put(
                    |PathParam(cart_id): PathParam<i32>,
                     JsonBody(body): JsonBody<UpdateCartRequest>| async move {
                        Json(serde_json::json!({ "cartId": cart_id, "quantity": body.quantity }))
                    },
                ),
            )
            .route(
                "/order/new",
                post(|body: Option<JsonBody<PlaceOrderRequest>>| async move {
                    let JsonBody(body) = body.unwrap_or_default();
                    Json(serde_json::json!({ "pickup": body.scheduled_pickup_time }))
                }),
            )
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request {
        let builder = http::Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(r#"{"itemId":1,"quantity":2.5}"#)]
    #[case(r#"{"itemId":1,"quantity":"2"}"#)]
    #[case(r#"{"itemId":1}"#)]
    #[case("not json")]
    #[tokio::test]
    async fn malformed_cart_body_is_a_json_bad_request(#[case] body: &str) {
        let response = cart_routes()
            .oneshot(request("POST", "/cart/new", Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_of(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_bad_request() {
        let response = cart_routes()
            .oneshot(
                http::Request::post("/cart/new")
                    .body(Body::from(r#"{"itemId":1,"quantity":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_of(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_json_bad_request() {
        let response = cart_routes()
            .oneshot(request("PUT", "/cart/abc", Some(r#"{"quantity":2}"#)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_of(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid path parameter"));
    }

    #[tokio::test]
    async fn well_formed_input_passes_through() {
        let response = cart_routes()
            .oneshot(request("PUT", "/cart/7", Some(r#"{"quantity":3}"#)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_of(response).await,
            serde_json::json!({ "cartId": 7, "quantity": 3 })
        );
    }

    #[rstest]
    #[case(None, Value::Null)]
    #[case(Some(r#"{"scheduledPickupTime":"2026-05-01T12:30"}"#), Value::from("2026-05-01T12:30"))]
    #[tokio::test]
    async fn order_body_is_optional(#[case] body: Option<&str>, #[case] pickup: Value) {
        let response = cart_routes()
            .oneshot(request("POST", "/order/new", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["pickup"], pickup);
    }

    #[tokio::test]
    async fn broken_order_body_is_still_rejected() {
        let response = cart_routes()
            .oneshot(request("POST", "/order/new", Some("{")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_of(response).await["error"].is_string());
    }
}
