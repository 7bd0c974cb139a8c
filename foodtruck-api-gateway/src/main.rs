use axum::Router;
use clap::Parser;
use dotenvy::dotenv;
use foodtruck_order_service::{Database, run_migrations};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod handlers;
mod models;
mod session;

use config::Config;
use handlers::{ApiDoc, AppState};

fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let database = Database::new(config.database_url.as_str());

    if config.run_migrations {
        let migrator = database.clone();
        let applied = tokio::task::spawn_blocking(move || {
            let conn = &mut migrator.connect()?;
            run_migrations(conn)
        })
        .await??;
        info!(applied, "database migrations applied");
    }

    let state = AppState {
        database,
        status_policy: config.order_status_policy,
    };
    info!(policy = %state.status_policy, "order status policy");

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use foodtruck_order_service::status::StatusPolicy;
    use rstest::rstest;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> Router {
        app(AppState {
            database: Database::new("postgres://unused@localhost/unused"),
            status_policy: StatusPolicy::Permissive,
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_session() {
        let response = test_app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[rstest]
    #[case("GET", "/api/v1/trucks/view")]
    #[case("GET", "/api/v1/trucks/myTruck")]
    #[case("GET", "/api/v1/trucks/3")]
    #[case("GET", "/api/v1/menuItem/view")]
    #[case("GET", "/api/v1/menuItem/truck/3/category/drinks")]
    #[case("GET", "/api/v1/cart/view")]
    #[case("DELETE", "/api/v1/cart/7")]
    #[case("GET", "/api/v1/order/myOrders")]
    #[case("GET", "/api/v1/order/details/1")]
    #[case("GET", "/api/v1/order/truckOrders")]
    #[tokio::test]
    async fn protected_routes_reject_missing_session(#[case] method: &str, #[case] uri: &str) {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn openapi_document_lists_order_routes() {
        let response = test_app()
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = json_body(response).await;
        assert!(document["paths"]["/api/v1/order/new"]["post"].is_object());
        assert!(document["paths"]["/api/v1/order/updateStatus/{order_id}"]["put"].is_object());
    }
}
