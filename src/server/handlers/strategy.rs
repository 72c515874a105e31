use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ApiJson;
use crate::core::errors::ApiError;
use crate::state::AppState;
use crate::strategy::{StrategyInput, Tab};

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub tab: String,
    pub prompt: String,
}

pub async fn generate_strategy(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<StrategyInput>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = state.strategy.generate_dashboard(&input).await?;
    Ok(Json(dashboard))
}

pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tab: Tab = payload.tab.parse()?;
    let content = state.strategy.regenerate_tab(tab, &payload.prompt).await?;
    Ok(Json(json!({ "tab": tab, "content": content })))
}
