use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ApiJson;
use crate::core::errors::ApiError;
use crate::rag::{RagError, Section};
use crate::state::AppState;
use crate::strategy::StrategyInput;

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    #[serde(flatten)]
    pub input: StrategyInput,
    pub top_k: Option<usize>,
}

fn parse_sections(sections: Option<&[String]>) -> Result<Option<HashSet<Section>>, RagError> {
    sections
        .map(|names| {
            names
                .iter()
                .map(|name| name.parse::<Section>())
                .collect::<Result<HashSet<_>, _>>()
        })
        .transpose()
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RetrieveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let filter = parse_sections(payload.sections.as_deref())?;
    let top_k = payload.top_k.unwrap_or(state.settings.retrieval.top_k);

    let results = state
        .retriever
        .retrieve(&payload.query, top_k, filter.as_ref())
        .await?;
    Ok(Json(json!({ "results": results })))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ContextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let context = state
        .strategy
        .augmentation_context(&payload.input, payload.top_k)
        .await?;
    Ok(Json(json!({ "context": context })))
}
