use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::AiError;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(crate) struct GeminiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    // Key travels in a header so it never shows up in logged URLs.
    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        debug!(
            model,
            turns = request.contents.len(),
            structured = request.generation_config.is_some(),
            "Gemini generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(AiError::Api { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                finish_reason = parsed.finish_reason().unwrap_or(""),
                "Gemini generateContent response"
            );
        }

        Ok(parsed)
    }
}
