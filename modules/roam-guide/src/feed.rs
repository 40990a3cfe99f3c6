use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use ai_client::{strip_code_blocks, truncate_to_char_boundary, StructuredOutput};
use roam_common::{Coordinates, PlaceCardData, UserPreferences};

use crate::normalizer::{FeedResponse, PlaceNormalizer};
use crate::prompts::feed_prompt;
use crate::traits::TextGenerator;

const BODY_PREVIEW_BYTES: usize = 200;

/// Issues the structured nearby-events query and normalizes the answer.
/// Every call is independent; callers replace their feed wholesale.
pub struct FeedService {
    generator: Arc<dyn TextGenerator>,
    normalizer: PlaceNormalizer,
    city_name: String,
}

impl FeedService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        normalizer: PlaceNormalizer,
        city_name: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            normalizer,
            city_name: city_name.into(),
        }
    }

    /// Never fails: upstream or parse errors yield an empty feed.
    pub async fn fetch(
        &self,
        location: Coordinates,
        preferences: &UserPreferences,
    ) -> Vec<PlaceCardData> {
        match self.try_fetch(location, preferences).await {
            Ok(places) => {
                info!(count = places.len(), city = %self.city_name, "Feed loaded");
                places
            }
            Err(e) => {
                warn!(error = %e, city = %self.city_name, "Feed query failed, returning empty feed");
                Vec::new()
            }
        }
    }

    async fn try_fetch(
        &self,
        location: Coordinates,
        preferences: &UserPreferences,
    ) -> Result<Vec<PlaceCardData>> {
        debug!(lat = location.latitude, lng = location.longitude, "Requesting feed");
        let prompt = feed_prompt(&self.city_name, location, preferences);
        let raw = self
            .generator
            .generate_structured(&prompt, FeedResponse::gemini_schema())
            .await
            .context("structured feed query")?;

        let body = strip_code_blocks(&raw);
        let response: FeedResponse = serde_json::from_str(body).with_context(|| {
            format!(
                "feed response is not valid JSON: {}",
                truncate_to_char_boundary(body, BODY_PREVIEW_BYTES)
            )
        })?;

        Ok(self.normalizer.normalize_all(&response.events))
    }
}
