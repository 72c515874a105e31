use axum::extract::FromRequest;

use crate::core::errors::ApiError;

pub mod config;
pub mod health;
pub mod retrieval;
pub mod strategy;

/// `Json` body extractor whose rejections are reported as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
