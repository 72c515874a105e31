use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "chunks": state.retriever.len(),
        "dimension": state.retriever.dimension(),
        "generation": state.generation,
        "embedding_model": state.retriever.embedder_model(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}
