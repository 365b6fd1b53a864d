// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP front end.
//!
//! `GET /` runs a render cycle and returns the page, `GET /api/map` returns
//! the assembled map as JSON, and `GET /healthz` is a liveness probe. A cycle
//! that cannot produce a map answers 500 with the error text.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};
use mesh_core::RenderableMap;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::service::MapService;

/// Error response carrying the failure text.
#[derive(Debug)]
struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Build the application router.
pub fn router(service: Arc<MapService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/map", get(map_json))
        .route("/healthz", get(healthz))
        .with_state(service)
}

/// Serve on `address` until `cancel_token` fires.
pub async fn serve(
    service: Arc<MapService>,
    address: &str,
    cancel_token: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Serving mesh map on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .context("HTTP server failed")
}

async fn index(State(service): State<Arc<MapService>>) -> Result<Html<String>, ServerError> {
    let output = service.run_cycle().await?;
    Ok(Html(output.html))
}

async fn map_json(
    State(service): State<Arc<MapService>>,
) -> Result<Json<RenderableMap>, ServerError> {
    Ok(Json(service.build_map().await?))
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn service_with(dir: &std::path::Path, snapshot: Option<&str>) -> Arc<MapService> {
        let data_path = dir.join("mesh_data.json");
        if let Some(text) = snapshot {
            std::fs::write(&data_path, text).unwrap();
        }
        Arc::new(MapService::new(AppConfig {
            data_path,
            output_dir: dir.join("maps"),
            ..AppConfig::default()
        }))
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_healthz() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_body(router(service_with(dir.path(), None)), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_index_renders_fallback_network() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_body(router(service_with(dir.path(), None)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"node_id\":\"node1\""));
        assert!(dir.path().join("maps").exists());
    }

    #[tokio::test]
    async fn test_map_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(service_with(
            dir.path(),
            Some(r#"{"nodes": [{"id": "base", "lat": 5.0, "lon": 6.0}]}"#),
        ));
        let (status, body) = get_body(app, "/api/map").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["center_lat"], 5.0);
        assert_eq!(value["markers"][0]["icon"], "star");
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(service_with(dir.path(), Some(r#"{"nodes": []}"#)));
        let (status, body) = get_body(app, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("no primary node"));
    }
}
