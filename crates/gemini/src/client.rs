//! HTTP transport for the Gemini API

use crate::{ApiErrorBody, GeminiError, GenerateContentRequest, GenerateContentResponse, Result};
use std::time::Duration;

/// Public Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client
///
/// The key travels in the `x-goog-api-key` header so it never shows up in
/// URLs echoed back by transport errors.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, None)
    }

    /// Create a client against a custom endpoint with an optional request timeout
    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        tracing::debug!(model, parts = request.part_count(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: ApiErrorBody::message_from(&body),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Parse(e.to_string()))?;

        if let Some(reason) = parsed.block_reason() {
            return Err(GeminiError::Blocked(reason.to_string()));
        }
        if let Some(usage) = &parsed.usage_metadata {
            tracing::debug!(
                model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "generateContent usage"
            );
        }

        Ok(parsed)
    }

    /// Call the model and return its concatenated text output
    pub async fn generate_text(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        self.generate_content(model, request)
            .await?
            .text()
            .ok_or(GeminiError::EmptyResponse)
    }
}
