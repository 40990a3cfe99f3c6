use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Trivandrum city centre, used whenever a location is unknown.
pub const TRIVANDRUM: Coordinates = Coordinates::new(8.5241, 76.9366);

// --- Place Types ---

/// When a listed event happens relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timing {
    Now,
    Week,
    Weekend,
}

impl Timing {
    /// Lenient parse of an upstream label; anything outside the three buckets is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NOW" => Some(Timing::Now),
            "WEEK" => Some(Timing::Week),
            "WEEKEND" => Some(Timing::Weekend),
            _ => None,
        }
    }
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timing::Now => write!(f, "NOW"),
            Timing::Week => write!(f, "WEEK"),
            Timing::Weekend => write!(f, "WEEKEND"),
        }
    }
}

pub const DEFAULT_RATING: &str = "Verified";

/// A place or event card, built once from untrusted upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCardData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub rating: String,
    pub snippet: String,
    /// Venue name.
    pub location: Option<String>,
    /// Ticketing or info link.
    pub uri: Option<String>,
    pub image_url: Option<String>,
    pub timing: Option<Timing>,
    /// Provenance, e.g. "Source: BookMyShow".
    pub description: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub accent_color: Option<String>,
}

// --- Conversation Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub grounding_sources: Option<Vec<GroundingSource>>,
    pub recommended_place: Option<PlaceCardData>,
}

impl Message {
    /// A user-authored message. Never carries sources or a recommendation.
    pub fn user(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            role: Role::User,
            text: text.into(),
            timestamp: now,
            grounding_sources: None,
            recommended_place: None,
        }
    }

    pub fn model(
        id: impl Into<String>,
        text: impl Into<String>,
        grounding_sources: Option<Vec<GroundingSource>>,
        recommended_place: Option<PlaceCardData>,
    ) -> Self {
        Self {
            id: id.into(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            grounding_sources,
            recommended_place,
        }
    }

    /// At most `limit` sources, for presentation. The full list stays on the message.
    pub fn display_sources(&self, limit: usize) -> &[GroundingSource] {
        match &self.grounding_sources {
            Some(sources) => &sources[..sources.len().min(limit)],
            None => &[],
        }
    }
}

// --- Community Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Contribution of a single vote of this polarity to the tally.
    pub fn weight(&self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => Err(format!("unknown vote '{other}', expected up or down")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Venue.
    pub location: String,
    /// Display label such as "Today 6:00 PM".
    pub time: String,
    pub author: String,
    pub votes: i64,
    pub comments: Vec<Comment>,
    /// This client's last vote on the event.
    pub is_user_voted: Option<Vote>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

// --- Preferences ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelGroup {
    #[default]
    Solo,
    Couple,
    Family,
    Friends,
}

impl std::fmt::Display for TravelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelGroup::Solo => write!(f, "Solo Traveler"),
            TravelGroup::Couple => write!(f, "Couple"),
            TravelGroup::Family => write!(f, "Family"),
            TravelGroup::Friends => write!(f, "Group of Friends"),
        }
    }
}

impl FromStr for TravelGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(TravelGroup::Solo),
            "couple" => Ok(TravelGroup::Couple),
            "family" => Ok(TravelGroup::Family),
            "friends" => Ok(TravelGroup::Friends),
            other => Err(format!(
                "unknown travel group '{other}', expected solo, couple, family or friends"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Free,
    Budget,
    #[default]
    Moderate,
    Luxury,
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Budget::Free => write!(f, "Free"),
            Budget::Budget => write!(f, "Budget"),
            Budget::Moderate => write!(f, "Moderate"),
            Budget::Luxury => write!(f, "Luxury"),
        }
    }
}

impl FromStr for Budget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Budget::Free),
            "budget" => Ok(Budget::Budget),
            "moderate" => Ok(Budget::Moderate),
            "luxury" => Ok(Budget::Luxury),
            other => Err(format!(
                "unknown budget '{other}', expected free, budget, moderate or luxury"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub group: TravelGroup,
    pub budget: Budget,
    /// Free-text interest; blank means no preference.
    pub activity_type: String,
}
