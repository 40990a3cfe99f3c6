mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;
pub use types::{GroundingChunk, WebSource};

use tracing::warn;

use crate::error::AiError;
use crate::traits::Message;
use client::GeminiClient;
use types::{Content, GenerateRequest};

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

/// Free-text reply of a conversational turn plus its grounding records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AiError::Config("GEMINI_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Search-grounded structured generation. Returns the raw JSON text;
    /// callers own the parse so a malformed body can be handled leniently.
    pub async fn generate_structured(
        &self,
        prompt: impl Into<String>,
        schema: serde_json::Value,
    ) -> Result<String, AiError> {
        let request = GenerateRequest::new()
            .content(Content::with_role("user", prompt))
            .google_search()
            .json_schema(schema)
            .temperature(0.0);

        let response = self.client().generate(&self.model, &request).await?;

        response.text().ok_or_else(|| {
            warn!(
                model = %self.model,
                finish_reason = response.finish_reason().unwrap_or("unknown"),
                "Gemini returned no structured text"
            );
            AiError::EmptyResponse("no text in structured response".into())
        })
    }

    /// One search-grounded conversational turn on top of replayed history.
    pub async fn chat(
        &self,
        system_instruction: impl Into<String>,
        history: &[Message],
        message: impl Into<String>,
    ) -> Result<ChatReply, AiError> {
        let request = GenerateRequest::new()
            .system(system_instruction)
            .contents(
                history
                    .iter()
                    .map(|m| Content::with_role(m.role.as_wire(), m.content.as_str())),
            )
            .content(Content::with_role("user", message))
            .google_search();

        let response = self.client().generate(&self.model, &request).await?;

        Ok(ChatReply {
            text: response.text().unwrap_or_default(),
            grounding_chunks: response.grounding_chunks(),
        })
    }
}
