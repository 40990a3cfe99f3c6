use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use ai_client::Message as WireMessage;
use roam_common::{Coordinates, Message, Role, UserPreferences};

use crate::grounding::extract_sources;
use crate::image_search::ImageSearch;
use crate::prompts::chat_system_instruction;
use crate::recommendation::{Recommendation, RecommendationParser};
use crate::traits::TextGenerator;

pub const FALLBACK_MESSAGE_ID: &str = "err";
pub const FALLBACK_TEXT: &str = "Connectivity issue with TVM event server.";
const EMPTY_PROSE_TEXT: &str = "I found a great event for you!";

/// Runs one conversational turn and assembles the model message.
pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
    parser: RecommendationParser,
    images: ImageSearch,
    city_name: String,
}

impl ChatService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        parser: RecommendationParser,
        images: ImageSearch,
        city_name: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            parser,
            images,
            city_name: city_name.into(),
        }
    }

    /// Always yields a model message; upstream failure becomes the fixed
    /// connectivity reply.
    pub async fn reply(
        &self,
        query: &str,
        location: Option<Coordinates>,
        preferences: &UserPreferences,
        history: &[Message],
    ) -> Message {
        match self.try_reply(query, location, preferences, history).await {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Chat turn failed, sending fallback reply");
                Message::model(FALLBACK_MESSAGE_ID, FALLBACK_TEXT, None, None)
            }
        }
    }

    async fn try_reply(
        &self,
        query: &str,
        location: Option<Coordinates>,
        preferences: &UserPreferences,
        history: &[Message],
    ) -> Result<Message> {
        let system = chat_system_instruction(&self.city_name, location, preferences);
        let wire_history = replay_history(history);

        let reply = self
            .generator
            .converse(&system, &wire_history, query)
            .await
            .context("conversational turn")?;

        let stamp = Utc::now().timestamp_millis();
        let parsed = self.parser.parse(&reply.text);
        let sources = extract_sources(&reply.grounding_chunks);

        let recommended_place = match parsed.recommendation {
            Recommendation::Recommendation(fields) => Some(fields.into_place(&self.images, stamp)),
            Recommendation::NoRecommendation => None,
        };
        let text = if parsed.prose.is_empty() {
            EMPTY_PROSE_TEXT.to_string()
        } else {
            parsed.prose
        };

        info!(
            sources = sources.len(),
            recommended = recommended_place.is_some(),
            "Chat reply assembled"
        );

        Ok(Message::model(
            stamp.to_string(),
            text,
            (!sources.is_empty()).then_some(sources),
            recommended_place,
        ))
    }
}

/// Only role and text go upstream.
fn replay_history(history: &[Message]) -> Vec<WireMessage> {
    history
        .iter()
        .map(|m| match m.role {
            Role::User => WireMessage::user(m.text.as_str()),
            Role::Model => WireMessage::model(m.text.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::MessageRole;

    #[test]
    fn history_keeps_only_role_and_text() {
        let mut model = Message::model("1", "Try Kovalam", None, None);
        model.grounding_sources = Some(vec![roam_common::GroundingSource {
            title: "T".into(),
            uri: "https://t.example".into(),
        }]);
        let wire = replay_history(&[Message::user("beaches?"), model]);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0].role, MessageRole::User);
        assert_eq!(wire[0].content, "beaches?");
        assert_eq!(wire[1].role, MessageRole::Model);
        assert_eq!(wire[1].content, "Try Kovalam");
    }
}
