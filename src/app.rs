//! REST API implementation.
//!
//! # Examples
//!
//! Info API.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! # let url = catalog_api::app::spawn_app().await;
//! let response = reqwest::get(format!("{}/info", url)).await.unwrap();
//! assert_eq!(200, response.status());
//! # });
//! ```

use std::time::Duration;

use crate::infra::database::DbPool;
use crate::infra::error::{InternalError, PanicHandler};
use crate::infra::middleware::MakeRequestIdSpan;
use crate::infra::openapi::ApiDoc;
use crate::infra::state::AppState;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e| async move {
            InternalError::Other(format!("Tower middleware failed: {e}")).into_response()
        }))
        .concurrency_limit(500);

    // The full application with docs and a REST API.
    Router::new()
        .route("/", get(|| async { Redirect::to("/api/swagger-ui") }))
        .merge(SwaggerUi::new("/api/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/api/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api/openapi.json").path("/api/rapidoc"))
        .nest("/api", crate::api::api(state.clone()))
        // Layers
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::infra::middleware::log_request_response,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Applies migrations and starts the axum server.
pub async fn run_app(listener: TcpListener, db: DbPool) -> color_eyre::Result<()> {
    sqlx::migrate!().run(&db).await?;

    let state = AppState::new(db);
    let app = app(state).into_make_service();

    tracing::info!("Starting axum on {:?}", listener.local_addr());
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(crate::infra::shutdown::shutdown_signal())
        .await;

    match exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }

    Ok(())
}

/// Spawn a server on a random port.
pub async fn spawn_app() -> String {
    let config = crate::infra::config::load_config().unwrap();
    let db = crate::infra::database::init_db(&config.database);
    spawn_app_with_db(db).await
}

/// Spawn a server on a random port with a custom database.
pub async fn spawn_app_with_db(db: DbPool) -> String {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(run_app(listener, db));
    format!("http://{address}:{port}/api")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::item::item_repository::Item,
        infra::{database::DbPool, error::ErrorBody, state::AppState},
    };
    use axum::{body::Body, Router};
    use futures::StreamExt;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app(db: DbPool) -> Router {
        let state = AppState::new(db);
        app(state)
    }

    async fn body_bytes(res: axum::response::Response) -> Vec<u8> {
        res.into_body()
            .into_data_stream()
            .filter_map(|res| std::future::ready(res.ok().map(|b| b.to_vec())))
            .concat()
            .await
    }

    #[sqlx::test]
    async fn swagger_ui_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/swagger-ui/index.html")
            .body(Body::empty())
            .unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    async fn redoc_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/redoc").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    async fn rapidoc_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/rapidoc").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, result.status())
    }

    #[sqlx::test]
    async fn root_redirects_to_swagger_ui(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/").body(Body::empty()).unwrap();
        let result = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::SEE_OTHER, result.status());
        assert_eq!("/api/swagger-ui", result.headers()["location"]);
    }

    #[sqlx::test]
    async fn info_oneshot(db: DbPool) {
        let app = test_app(db);
        let req = Request::get("/api/info").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(StatusCode::OK, res.status());
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(res).await).unwrap();
        assert_eq!(env!("CARGO_PKG_NAME"), body["name"]);
        assert_eq!(env!("CARGO_PKG_VERSION"), body["version"]);
    }

    #[sqlx::test]
    async fn item_crud_flow(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        // Create
        let response = client
            .post(format!("{url}/items"))
            .json(&serde_json::json!({"nom": "Test Item", "prix": 9.99}))
            .send()
            .await
            .unwrap();
        assert_eq!(201, response.status());
        let item: Item = response.json().await.unwrap();
        assert!(item.id > 0);
        assert_eq!("Test Item", item.nom);
        assert_eq!(9.99, item.prix);

        // Read
        let fetched: Item = client
            .get(format!("{url}/items/{}", item.id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(item, fetched);

        // Update only the name
        let response = client
            .put(format!("{url}/items/{}", item.id))
            .json(&serde_json::json!({"nom": "New Name"}))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status());
        let updated: Item = response.json().await.unwrap();
        assert_eq!("New Name", updated.nom);
        assert_eq!(9.99, updated.prix);

        // Delete
        let response = client
            .delete(format!("{url}/items/{}", item.id))
            .send()
            .await
            .unwrap();
        assert_eq!(204, response.status());

        // Gone
        let response = client
            .get(format!("{url}/items/{}", item.id))
            .send()
            .await
            .unwrap();
        assert_eq!(404, response.status());
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!("not found", body.message());
    }

    #[sqlx::test]
    async fn listing_items_honors_skip_and_limit(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        for i in 1..=3 {
            let response = client
                .post(format!("{url}/items"))
                .json(&serde_json::json!({"nom": format!("Item {i}"), "prix": i as f64}))
                .send()
                .await
                .unwrap();
            assert_eq!(201, response.status());
        }

        let items: Vec<Item> = client
            .get(format!("{url}/items?skip=1&limit=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(1, items.len());
        assert_eq!("Item 2", items[0].nom);
    }

    #[sqlx::test]
    async fn deleting_a_missing_item_gives_404(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();
        let response = client
            .delete(format!("{url}/items/999"))
            .send()
            .await
            .unwrap();
        assert_eq!(404, response.status());
    }

    #[sqlx::test]
    async fn creating_an_invalid_item_gives_422(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{url}/items"))
            .json(&serde_json::json!({"nom": "", "prix": 1.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(422, response.status());
    }

    #[sqlx::test]
    async fn streaming_items_returns_json_lines(db: DbPool) {
        let url = spawn_app_with_db(db).await;
        let client = reqwest::Client::new();

        for nom in ["Premier", "Second"] {
            let response = client
                .post(format!("{url}/items"))
                .json(&serde_json::json!({"nom": nom, "prix": 1.0}))
                .send()
                .await
                .unwrap();
            assert_eq!(201, response.status());
        }

        let response = client
            .get(format!("{url}/items2"))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status());
        let body = response.text().await.unwrap();
        let items: Vec<Item> = body
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(2, items.len());
        assert_eq!("Premier", items[0].nom);
        assert_eq!("Second", items[1].nom);
    }
}
