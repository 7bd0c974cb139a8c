use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{http::StatusCode, response::Json};
use foodtruck_order_service::OrderingError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Session expired. Please log in again.")]
    SessionExpired,
    #[error(transparent)]
    Ordering(#[from] OrderingError),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::Ordering(OrderingError::invalid_input(message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::Ordering(err) => match err {
                OrderingError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderingError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderingError::InvalidInput(_)
                | OrderingError::Conflict(_)
                | OrderingError::Unavailable(_)
                | OrderingError::EmptyCart
                | OrderingError::ItemsUnavailable
                | OrderingError::TruckNotAccepting
                | OrderingError::ScheduleTooSoon => StatusCode::BAD_REQUEST,
                OrderingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Ordering(OrderingError::Internal(source)) => {
                error!(error = %source, "request failed");
                "Internal server error".to_string()
            }
            err => err.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use foodtruck_order_service::StoreError;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ApiError::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::SessionExpired, StatusCode::UNAUTHORIZED)]
    #[case(OrderingError::forbidden("no").into(), StatusCode::FORBIDDEN)]
    #[case(OrderingError::not_found("gone").into(), StatusCode::NOT_FOUND)]
    #[case(OrderingError::conflict("two trucks").into(), StatusCode::BAD_REQUEST)]
    #[case(OrderingError::EmptyCart.into(), StatusCode::BAD_REQUEST)]
    #[case(OrderingError::ScheduleTooSoon.into(), StatusCode::BAD_REQUEST)]
    #[case(
        OrderingError::Internal(StoreError::Worker("panicked".into())).into(),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn maps_to_status(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let err: ApiError = OrderingError::Internal(StoreError::Worker("secret".into())).into();
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
