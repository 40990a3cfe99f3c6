// Trait seam for the generative text service.
//
// TextGenerator covers both upstream request shapes: the search-grounded
// structured query behind the feed and the conversational turn behind chat.
// Tests drive the orchestrators through MockGenerator instead of the network.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use ai_client::{ChatReply, Gemini, Message};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Raw JSON text conforming (hopefully) to `schema`.
    async fn generate_structured(&self, prompt: &str, schema: Value) -> Result<String>;

    /// One conversational turn on top of `(role, text)` history.
    async fn converse(
        &self,
        system_instruction: &str,
        history: &[Message],
        message: &str,
    ) -> Result<ChatReply>;
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate_structured(&self, prompt: &str, schema: Value) -> Result<String> {
        Ok(Gemini::generate_structured(self, prompt, schema).await?)
    }

    async fn converse(
        &self,
        system_instruction: &str,
        history: &[Message],
        message: &str,
    ) -> Result<ChatReply> {
        Ok(self.chat(system_instruction, history, message).await?)
    }
}
