//! Remote tailoring engine. Forwards the validated request to an HTTP service that
//! speaks the same request/result contract.
//!
//! Wire format: `POST <endpoint>` with the request as JSON; the service answers
//! `{ "bullet_points": [{ "id", "text", "keywords" }] }`. One attempt per call:
//! the engine contract has no retries and no partial results.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;
use crate::models::tailoring::{BulletInput, TailoringResult, ValidRequest};
use crate::tailoring::engine::TailoringEngine;

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    bullet_points: Vec<BulletInput>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    error: RemoteErrorBody,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct RemoteEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteEngine {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the tailoring engine")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TailoringEngine for RemoteEngine {
    async fn tailor(&self, request: &ValidRequest) -> Result<TailoringResult, AppError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| AppError::Engine(format!("request to tailoring engine failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RemoteError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Engine(format!(
                "tailoring engine returned {status}: {message}"
            )));
        }

        let body: RemoteResponse = response
            .json()
            .await
            .map_err(|e| AppError::Engine(format!("undecodable engine response: {e}")))?;

        debug!(
            "Remote engine answered with {} bullet points",
            body.bullet_points.len()
        );

        TailoringResult::from_inputs(body.bullet_points)
            .map_err(|e| AppError::Engine(format!("invalid engine response: {e}")))
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
