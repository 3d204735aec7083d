pub mod auth;
pub mod cards;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod request_id;
pub mod seed;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    cards::CardDataSource,
    database::Database,
    handlers::{SeedSettings, get_cards, health_check, not_found, seed_database},
    request_id::request_id_middleware,
    seed::{SeedTarget, Seeder},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::seed::seed_database,
        handlers::cards::get_cards,
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "seed", description = "Database seeding"),
        (name = "dashboard", description = "Dashboard summary data"),
    )
)]
pub struct ApiDoc;

/// Builds the router backed by PostgreSQL for both seeding and card data.
pub fn create_router(db: Database, seeder: Seeder, settings: SeedSettings) -> Router {
    let db = Arc::new(db);
    router_with(db.clone(), db, seeder, settings)
}

/// Builds the router with explicit collaborators.
pub fn router_with(
    seed_target: Arc<dyn SeedTarget>,
    card_source: Arc<dyn CardDataSource>,
    seeder: Seeder,
    settings: SeedSettings,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/seed", get(seed_database))
        .route("/dashboard/cards", get(get_cards))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(Extension(seed_target))
        .layer(Extension(card_source))
        .layer(Extension(seeder))
        .layer(Extension(settings))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

pub async fn run_server(app: Router, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use seed_data::SeedDataset;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        auth::PasswordHasher,
        config::HashCost,
        seed::{MemoryStore, StatementKind, Table},
    };

    fn test_router(store: &MemoryStore, expose_diagnostics: bool) -> Router {
        let hasher = PasswordHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let seeder = Seeder::new(SeedDataset::placeholder().unwrap(), hasher);
        let store = Arc::new(store.clone());
        router_with(
            store.clone(),
            store,
            seeder,
            SeedSettings { expose_diagnostics },
        )
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_seed_success_response() {
        let store = MemoryStore::new();
        let response = get(test_router(&store, true), "/seed").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Database seeded successfully"})
        );
        assert_eq!(store.row_count(Table::Revenue), 12);
    }

    #[tokio::test]
    async fn test_seed_twice_still_succeeds() {
        let store = MemoryStore::new();
        let router = test_router(&store, true);

        let first = get(router.clone(), "/seed").await;
        let second = get(router, "/seed").await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(store.row_count(Table::Invoices), 13);
    }

    #[tokio::test]
    async fn test_seed_failure_response_carries_diagnostics() {
        let store = MemoryStore::new();
        store.fail_on(StatementKind::Insert(Table::Revenue), Some("Mar"));

        let response = get(test_router(&store, true), "/seed").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Failed to seed database");
        assert!(body["error"].as_str().unwrap().contains("injected failure"));
        assert!(!body["stack"].as_str().unwrap().is_empty());
        assert_eq!(store.row_count(Table::Users), 0);
    }

    #[tokio::test]
    async fn test_seed_failure_hides_diagnostics_when_disabled() {
        let store = MemoryStore::new();
        store.fail_on(StatementKind::CreateExtension, None);

        let response = get(test_router(&store, false), "/seed").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Failed to seed database"})
        );
    }

    #[tokio::test]
    async fn test_cards_after_seed_show_real_totals() {
        let store = MemoryStore::new();
        let router = test_router(&store, true);
        get(router.clone(), "/seed").await;

        let response = get(router, "/dashboard/cards").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"cards": [
                {"title": "Collected", "value": 100626, "type": "collected"},
                {"title": "Pending", "value": 125632, "type": "pending"},
                {"title": "Total Invoices", "value": 13, "type": "invoices"},
                {"title": "Total Customers", "value": 6, "type": "customers"},
            ]})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cards_on_empty_store_fall_back() {
        let store = MemoryStore::new();
        let response = get(test_router(&store, true), "/dashboard/cards").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let values: Vec<i64> = body["cards"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["value"].as_i64().unwrap())
            .collect();
        assert_eq!(values, vec![12, 6, 25, 55]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let store = MemoryStore::new();
        let response = get(test_router(&store, true), "/seed/now").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let store = MemoryStore::new();
        let response = test_router(&store, true)
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
