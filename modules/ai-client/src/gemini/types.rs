use serde::{Deserialize, Serialize};

// =============================================================================
// Content
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set by thinking models on reasoning parts; those are not reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

// =============================================================================
// Tools / Generation Config
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ToolWire {
    #[serde(rename = "googleSearch")]
    pub google_search: serde_json::Value,
}

impl ToolWire {
    pub fn google_search() -> Self {
        Self {
            google_search: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

// =============================================================================
// Generate Request
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    pub fn new() -> Self {
        Self {
            contents: Vec::new(),
            system_instruction: None,
            tools: None,
            generation_config: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::system(system));
        self
    }

    pub fn content(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    pub fn contents(mut self, contents: impl IntoIterator<Item = Content>) -> Self {
        self.contents.extend(contents);
        self
    }

    pub fn google_search(mut self) -> Self {
        self.tools
            .get_or_insert_with(Vec::new)
            .push(ToolWire::google_search());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    pub fn json_schema(mut self, schema: serde_json::Value) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema);
        self
    }
}

// =============================================================================
// Generate Response
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl GenerateResponse {
    /// Concatenated non-thought text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought.unwrap_or(false))
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Grounding chunks of the first candidate, in upstream order.
    pub fn grounding_chunks(&self) -> Vec<GroundingChunk> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.clone())
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

// =============================================================================
// Grounding (public: consumed by the source extractor)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One citation-like record attached to a grounded reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GroundingChunk {
    pub fn web(title: Option<&str>, uri: Option<&str>) -> Self {
        Self {
            web: Some(WebSource {
                uri: uri.map(str::to_string),
                title: title.map(str::to_string),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_with_camel_case_and_search_tool() {
        let request = GenerateRequest::new()
            .system("be brief")
            .content(Content::with_role("user", "hi"))
            .google_search()
            .json_schema(json!({"type": "object"}));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["tools"][0]["googleSearch"], json!({}));
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn response_text_skips_thought_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "planning...", "thought": true},
                        {"text": "Try the "},
                        {"text": "beach."}
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("Try the beach."));
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert!(response.grounding_chunks().is_empty());
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn grounding_chunks_tolerate_missing_web() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "ok"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {},
                        {"web": {"title": "no uri"}}
                    ]
                }
            }]
        }))
        .unwrap();

        let chunks = response.grounding_chunks();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], GroundingChunk::web(Some("A"), Some("https://a.example")));
        assert!(chunks[1].web.is_none());
        assert_eq!(chunks[2].web.as_ref().unwrap().uri, None);
    }
}
