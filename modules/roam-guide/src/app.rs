use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use roam_common::{Config, Coordinates, RoamError, UserPreferences};

use crate::chat::ChatService;
use crate::community::CommunityBoard;
use crate::feed::FeedService;
use crate::geo::resolve_location;
use crate::image_search::ImageSearch;
use crate::normalizer::PlaceNormalizer;
use crate::recommendation::{RecommendationDefaults, RecommendationParser};
use crate::state::{Action, AppState, Effect};
use crate::traits::TextGenerator;
use crate::voting::VotePolicy;

/// Owns the state container and runs the effects its transitions request.
/// Effects run to completion one at a time, so writes are serialized.
pub struct App {
    state: AppState,
    feed: FeedService,
    chat: ChatService,
}

impl App {
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<Self, RoamError> {
        let images = ImageSearch::new(&config.image_base_url)?;
        let feed = FeedService::new(
            generator.clone(),
            PlaceNormalizer::new(config.default_location, images.clone()),
            &config.city_name,
        );
        let chat = ChatService::new(
            generator,
            RecommendationParser::new(RecommendationDefaults::for_city(
                &config.city_name,
                config.default_location,
            )),
            images,
            &config.city_name,
        );
        let community = CommunityBoard::seeded(
            Utc::now().timestamp_millis(),
            VotePolicy::new(config.comment_unlock_threshold),
        );

        Ok(Self {
            state: AppState::new(config.default_location, community),
            feed,
            chat,
        })
    }

    /// Seed session context before the first dispatch without starting a
    /// feed query.
    pub fn with_session(
        mut self,
        location: Option<Coordinates>,
        preferences: UserPreferences,
    ) -> Self {
        self.state.location =
            location.map(|reading| resolve_location(Some(reading), self.state.fallback_location));
        self.state.preferences = preferences;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply `action` and follow any effect chain it starts.
    pub async fn dispatch(&mut self, action: Action) -> Result<(), RoamError> {
        let mut next = self.state.apply(action)?;
        while let Some(effect) = next.take() {
            let action = self.run(effect).await;
            next = self.state.apply(action)?;
        }
        Ok(())
    }

    async fn run(&self, effect: Effect) -> Action {
        match effect {
            Effect::FetchFeed {
                ticket,
                location,
                preferences,
            } => {
                info!(ticket = ticket.0, "Fetching feed");
                let places = self.feed.fetch(location, &preferences).await;
                Action::FeedLoaded { ticket, places }
            }
            Effect::SendChat {
                query,
                location,
                preferences,
                history,
            } => {
                let message = self
                    .chat
                    .reply(&query, location, &preferences, &history)
                    .await;
                Action::ModelReplied(message)
            }
        }
    }
}
