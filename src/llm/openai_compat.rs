//! Clients for OpenAI-compatible `/v1/embeddings` and `/v1/chat/completions`
//! endpoints (LM Studio, llama.cpp server, vLLM, hosted APIs).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::Generator;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::settings::{EmbeddingSettings, GenerationSettings};
use crate::rag::{Embedder, RagError};
use crate::vector_math;

fn build_client(timeout_secs: u64) -> Result<Client, RagError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(RagError::unavailable)
}

fn with_auth(builder: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => builder.bearer_auth(key),
        _ => builder,
    }
}

#[derive(Clone)]
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    batch_size: usize,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, RagError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            batch_size: settings.batch_size.max(1),
            client: build_client(settings.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let res = with_auth(self.client.post(&url), self.api_key.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(RagError::unavailable)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::CollaboratorUnavailable(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(RagError::unavailable)?;
        parse_embeddings(&payload, texts.len())
    }
}

/// Pull vectors out of an embeddings response, in input order, unit-normalized.
pub(crate) fn parse_embeddings(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, RagError> {
    let data = payload["data"].as_array().ok_or_else(|| {
        RagError::CollaboratorUnavailable("embedding response has no 'data' array".to_string())
    })?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_idx, item) in data.iter().enumerate() {
        let values = item["embedding"].as_array().ok_or_else(|| {
            RagError::CollaboratorUnavailable("embedding item has no 'embedding' array".to_string())
        })?;
        let mut vector: Vec<f32> = values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();
        if vector.len() != values.len() {
            return Err(RagError::CollaboratorUnavailable(
                "embedding contains non-numeric values".to_string(),
            ));
        }
        vector_math::l2_normalize(&mut vector).map_err(RagError::unavailable)?;
        let idx = item["index"]
            .as_u64()
            .map(|i| i as usize)
            .unwrap_or(fallback_idx);
        indexed.push((idx, vector));
    }
    indexed.sort_by_key(|(idx, _)| *idx);

    if indexed.len() != expected {
        return Err(RagError::ShapeMismatch {
            what: "embeddings returned for batch",
            expected,
            actual: indexed.len(),
        });
    }
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[derive(Clone)]
pub struct ChatCompletionGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    settings: GenerationSettings,
    client: Client,
}

impl ChatCompletionGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self, RagError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            settings: settings.clone(),
            client: build_client(settings.timeout_secs)?,
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = with_auth(self.client.post(&url), self.api_key.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(RagError::unavailable)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::CollaboratorUnavailable(format!(
                "chat completion failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(RagError::unavailable)?;
        parse_chat_content(&payload)
    }
}

pub(crate) fn parse_chat_content(payload: &Value) -> Result<String, RagError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            RagError::CollaboratorUnavailable("chat response has no message content".to_string())
        })
}

#[async_trait]
impl Generator for ChatCompletionGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_settings(&self.settings);
        self.chat(request).await
    }
}
