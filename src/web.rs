//! JSON HTTP surface over the presentation boundary

use crate::LocationResolver;
use crate::state::WidgetView;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

pub fn router(resolver: LocationResolver) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/search", post(search))
        .route("/current-location", post(current_location))
        .with_state(resolver);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new().nest("/api", api).layer(cors)
}

pub async fn run(resolver: LocationResolver, port: u16) -> Result<()> {
    let app = router(resolver);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down web server");
}

async fn health() -> &'static str {
    "ok"
}

async fn get_state(State(resolver): State<LocationResolver>) -> Json<WidgetView> {
    Json(resolver.view())
}

async fn search(
    State(resolver): State<LocationResolver>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<WidgetView>, StatusCode> {
    if request.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    resolver.submit_query(&request.query).await;
    Ok(Json(resolver.view()))
}

async fn current_location(State(resolver): State<LocationResolver>) -> Json<WidgetView> {
    resolver.use_current_location().await;
    Json(resolver.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::geolocation::UnsupportedGeolocator;
    use crate::models::{LocationCandidate, WeatherSnapshot};
    use crate::{ErrorCode, WeatherDeskError, WeatherSource};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NotFoundSource;

    #[async_trait]
    impl WeatherSource for NotFoundSource {
        async fn forecast(&self, _query: &str) -> crate::Result<WeatherSnapshot> {
            Err(WeatherDeskError::api(
                "No matching location found.",
                ErrorCode::ApiLocationNotFound,
            ))
        }

        async fn search(&self, _query: &str) -> crate::Result<Vec<LocationCandidate>> {
            Ok(Vec::new())
        }
    }

    fn app() -> Router {
        router(LocationResolver::new(
            Arc::new(NotFoundSource),
            Arc::new(UnsupportedGeolocator),
            ResolverConfig::default(),
        ))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_reports_failure() {
        let response = app()
            .oneshot(
                Request::post("/api/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"Atlantis"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["location"], "Atlantis");
        assert_eq!(json["loading"], false);
        assert_eq!(json["error"], "No matching location found.");
        assert!(json["weather"].is_null());
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let response = app()
            .oneshot(
                Request::post("/api/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_current_location_unsupported() {
        let response = app()
            .oneshot(
                Request::post("/api/current-location")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["geoError"], "Geolocation is not supported on this device");
        assert_eq!(json["loading"], false);
    }
}
