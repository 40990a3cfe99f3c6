// Test doubles for the guide pipeline.
//
// MockGenerator (TextGenerator) returns canned structured text and chat
// replies, or fails on demand. It records every prompt and history it sees
// so tests can assert on what went upstream.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use ai_client::{ChatReply, GroundingChunk, Message};

use crate::traits::TextGenerator;

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

/// Builder pattern: `.with_structured()`, `.with_reply()`, `.failing()`.
/// Unconfigured calls return `Err`.
#[derive(Default)]
pub struct MockGenerator {
    structured: Option<String>,
    reply: Option<ChatReply>,
    fail: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Structured {
        prompt: String,
        schema: Value,
    },
    Converse {
        system_instruction: String,
        history: Vec<Message>,
        message: String,
    },
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structured(mut self, raw: impl Into<String>) -> Self {
        self.structured = Some(raw.into());
        self
    }

    pub fn with_reply(mut self, text: impl Into<String>, chunks: Vec<GroundingChunk>) -> Self {
        self.reply = Some(ChatReply {
            text: text.into(),
            grounding_chunks: chunks,
        });
        self
    }

    /// Every call fails as if the service were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate_structured(&self, prompt: &str, schema: Value) -> Result<String> {
        self.record(RecordedCall::Structured {
            prompt: prompt.to_string(),
            schema,
        });
        if self.fail {
            bail!("MockGenerator: connection refused");
        }
        match &self.structured {
            Some(raw) => Ok(raw.clone()),
            None => bail!("MockGenerator: no structured response registered"),
        }
    }

    async fn converse(
        &self,
        system_instruction: &str,
        history: &[Message],
        message: &str,
    ) -> Result<ChatReply> {
        self.record(RecordedCall::Converse {
            system_instruction: system_instruction.to_string(),
            history: history.to_vec(),
            message: message.to_string(),
        });
        if self.fail {
            bail!("MockGenerator: connection refused");
        }
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => bail!("MockGenerator: no chat reply registered"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A structured feed body with two events, one missing every optional field.
pub fn sample_feed_json() -> String {
    serde_json::json!({
        "events": [
            {
                "name": "Nishagandhi Dance Festival",
                "type": "Dance",
                "rating": "4.7",
                "snippet": "Classical dance under the stars, 6:30 PM, free entry",
                "location": "Nishagandhi Auditorium, Kanakakkunnu",
                "timing": "WEEK",
                "latitude": 8.5106,
                "longitude": 76.9553,
                "sourceName": "The Hindu",
                "sourceLink": "https://example.com/nishagandhi",
                "imageKeywords": "kathakali dancer stage lights",
                "accentColor": "#6C63FF"
            },
            {
                "name": "Shanghumugham Sunset Walk",
                "type": "Outdoors",
                "snippet": "Evening beach walk, 5 PM",
                "location": "Shanghumugham Beach",
                "timing": "NOW",
                "sourceLink": "https://example.com/walk",
                "imageKeywords": "kerala beach sunset crowd"
            }
        ]
    })
    .to_string()
}
