//! Application state and its single update path.
//!
//! All mutation goes through [`AppState::apply`]. Upstream work is not done
//! here: `apply` hands back an [`Effect`] for the caller to run, and the
//! result comes back in as another [`Action`].

use tracing::{debug, info};

use roam_common::{
    Coordinates, Message, PlaceCardData, RoamError, UserPreferences, Vote,
};

use crate::community::CommunityBoard;
use crate::geo::resolve_location;

/// Identifies one feed request. Only the latest ticket may write the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeedTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LocationResolved(Option<Coordinates>),
    PreferencesChanged(UserPreferences),
    FeedRequested,
    FeedLoaded {
        ticket: FeedTicket,
        places: Vec<PlaceCardData>,
    },
    UserMessageSent(String),
    ModelReplied(Message),
    Voted {
        event_id: String,
        vote: Vote,
    },
    CommentAdded {
        event_id: String,
        text: String,
    },
    PlaceSelected(PlaceCardData),
    PlaceDismissed,
    DirectionsRequested,
    DirectionsClosed,
}

/// Upstream work requested by a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchFeed {
        ticket: FeedTicket,
        location: Coordinates,
        preferences: UserPreferences,
    },
    SendChat {
        query: String,
        location: Option<Coordinates>,
        preferences: UserPreferences,
        /// Conversation before this query.
        history: Vec<Message>,
    },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub fallback_location: Coordinates,
    pub location: Option<Coordinates>,
    pub preferences: UserPreferences,
    pub feed: Vec<PlaceCardData>,
    pub feed_loading: bool,
    pub feed_seq: u64,
    pub messages: Vec<Message>,
    pub chat_loading: bool,
    pub community: CommunityBoard,
    pub selected_place: Option<PlaceCardData>,
    pub navigation_target: Option<PlaceCardData>,
}

impl AppState {
    pub fn new(fallback_location: Coordinates, community: CommunityBoard) -> Self {
        Self {
            fallback_location,
            location: None,
            preferences: UserPreferences::default(),
            feed: Vec::new(),
            feed_loading: false,
            feed_seq: 0,
            messages: Vec::new(),
            chat_loading: false,
            community,
            selected_place: None,
            navigation_target: None,
        }
    }

    pub fn apply(&mut self, action: Action) -> Result<Option<Effect>, RoamError> {
        match action {
            Action::LocationResolved(reading) => {
                self.location = Some(resolve_location(reading, self.fallback_location));
                Ok(Some(self.request_feed()))
            }
            Action::PreferencesChanged(preferences) => {
                self.preferences = preferences;
                Ok(Some(self.request_feed()))
            }
            Action::FeedRequested => Ok(Some(self.request_feed())),
            Action::FeedLoaded { ticket, places } => {
                if ticket.0 != self.feed_seq {
                    debug!(
                        ticket = ticket.0,
                        latest = self.feed_seq,
                        "Dropping stale feed result"
                    );
                    return Ok(None);
                }
                info!(count = places.len(), ticket = ticket.0, "Feed replaced");
                self.feed = places;
                self.feed_loading = false;
                Ok(None)
            }
            Action::UserMessageSent(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                let history = self.messages.clone();
                self.messages.push(Message::user(text));
                self.chat_loading = true;
                Ok(Some(Effect::SendChat {
                    query: text.to_string(),
                    location: self.location,
                    preferences: self.preferences.clone(),
                    history,
                }))
            }
            Action::ModelReplied(message) => {
                self.messages.push(message);
                self.chat_loading = false;
                Ok(None)
            }
            Action::Voted { event_id, vote } => {
                self.community.vote(&event_id, vote)?;
                Ok(None)
            }
            Action::CommentAdded { event_id, text } => {
                self.community.add_comment(&event_id, &text)?;
                Ok(None)
            }
            Action::PlaceSelected(place) => {
                self.selected_place = Some(place);
                Ok(None)
            }
            Action::PlaceDismissed => {
                self.selected_place = None;
                Ok(None)
            }
            Action::DirectionsRequested => {
                match self.selected_place.take() {
                    Some(place) if place.coordinates.is_some() => {
                        self.navigation_target = Some(place);
                    }
                    other => self.selected_place = other,
                }
                Ok(None)
            }
            Action::DirectionsClosed => {
                self.navigation_target = None;
                Ok(None)
            }
        }
    }

    fn request_feed(&mut self) -> Effect {
        self.feed_seq += 1;
        self.feed_loading = true;
        Effect::FetchFeed {
            ticket: FeedTicket(self.feed_seq),
            location: self.location.unwrap_or(self.fallback_location),
            preferences: self.preferences.clone(),
        }
    }
}
