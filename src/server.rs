//! Read-only HTTP query service over an analyzed repository snapshot.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::error::{GraphError, Result};
use crate::model::CodeElement;

#[derive(Clone)]
struct AppState {
    elements: Arc<Vec<CodeElement>>,
}

/// Router over a fixed element snapshot. No write routes exist; the snapshot
/// is taken once at startup.
pub fn router(elements: Vec<CodeElement>) -> Router {
    let state = AppState {
        elements: Arc::new(elements),
    };
    Router::new()
        .route("/elements", get(list_elements))
        .route("/relationships", get(list_relationships))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve(elements: Vec<CodeElement>, addr: SocketAddr) -> Result<()> {
    let app = router(elements);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "query server listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| GraphError::Server(e.to_string()))
}

async fn list_elements(State(state): State<AppState>) -> Json<Vec<CodeElement>> {
    Json(state.elements.as_ref().clone())
}

/// `{name: [deps]}` for every element with at least one dependency.
/// Dependency sets serialize sorted.
async fn list_relationships(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    let map = state
        .elements
        .iter()
        .filter(|e| !e.dependencies.is_empty())
        .map(|e| {
            (
                e.name.clone(),
                e.dependencies.iter().cloned().collect::<Vec<_>>(),
            )
        })
        .collect();
    Json(map)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}
