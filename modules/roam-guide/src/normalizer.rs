//! Raw event records → `PlaceCardData`.
//!
//! Records come from a search-grounded structured generation call and are
//! untrusted: the outer list may arrive stringified, individual records may
//! violate the schema, optional fields are routinely missing. Everything
//! here degrades to a default instead of failing the batch.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use roam_common::{Coordinates, PlaceCardData, Timing, DEFAULT_RATING};

use crate::image_search::ImageSearch;

const DEFAULT_SOURCE_LABEL: &str = "Local Verification";
const DEFAULT_CATEGORY: &str = "Event";
const DEFAULT_IMAGE_KEYWORDS: &str = "event";

/// What the model is asked to return for each event. Only feeds the
/// response schema; parsing goes through [`RawEventRecord`].
#[derive(Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRecordSchema {
    /// Official name of the event
    pub name: String,
    /// Category: e.g., Concert, Workshop, Food Fest
    #[serde(rename = "type")]
    pub category: String,
    /// Rating or 'Verified'
    pub rating: Option<String>,
    /// Detailed description including time and price
    pub snippet: String,
    /// Venue name and area
    pub location: String,
    /// Must be one of: NOW, WEEK, WEEKEND
    pub timing: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Platform name (e.g. BookMyShow)
    pub source_name: Option<String>,
    /// Direct URL to event
    pub source_link: String,
    /// 3-4 highly specific visual keywords for photo search
    pub image_keywords: String,
    /// A hex code for the event vibe: e.g. '#FF5733' for food, '#6C63FF' for tech
    pub accent_color: Option<String>,
}

/// What the model actually sends back. Only `name` is mandatory; every other
/// field degrades to empty or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRecord {
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timing: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub source_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_link: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_keywords: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub accent_color: Option<String>,
}

/// The full structured response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FeedResponse {
    #[serde(default, deserialize_with = "deserialize_events")]
    #[schemars(with = "Vec<EventRecordSchema>")]
    pub events: Vec<RawEventRecord>,
}

// Strings and numbers are both read as text; anything else is absent.
fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

// Numbers or numeric strings ("8.5"); anything else is absent.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a JSON array, a stringified JSON array, or null. Entries that are
/// not objects or carry no `name` are dropped one by one rather than sinking
/// the list.
fn deserialize_events<'de, D>(deserializer: D) -> std::result::Result<Vec<RawEventRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::String(ref s) => {
            serde_json::from_str::<Vec<serde_json::Value>>(s).map_err(de::Error::custom)?
        }
        serde_json::Value::Null => return Ok(Vec::new()),
        _ => return Err(de::Error::custom("events must be an array or JSON string")),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawEventRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Dropped malformed event record");
                None
            }
        })
        .collect())
}

/// Turns raw records into cards. Pure apart from the id timestamp.
#[derive(Debug, Clone)]
pub struct PlaceNormalizer {
    fallback: Coordinates,
    images: ImageSearch,
}

impl PlaceNormalizer {
    pub fn new(fallback: Coordinates, images: ImageSearch) -> Self {
        Self { fallback, images }
    }

    pub fn normalize(&self, record: &RawEventRecord, index: usize) -> PlaceCardData {
        PlaceCardData {
            id: format!("tvm-event-{index}-{}", Utc::now().timestamp_millis()),
            name: record.name.trim().to_string(),
            category: non_empty(Some(record.category.as_str()))
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            rating: non_empty(record.rating.as_deref())
                .unwrap_or(DEFAULT_RATING)
                .to_string(),
            snippet: record.snippet.trim().to_string(),
            location: non_empty(Some(record.location.as_str())).map(str::to_string),
            uri: non_empty(Some(record.source_link.as_str())).map(str::to_string),
            image_url: Some(self.images.url_for(image_keywords(record), index)),
            timing: Timing::parse(&record.timing),
            description: Some(format!(
                "Source: {}",
                non_empty(record.source_name.as_deref()).unwrap_or(DEFAULT_SOURCE_LABEL)
            )),
            coordinates: Some(self.coordinates(record)),
            accent_color: non_empty(record.accent_color.as_deref()).map(str::to_string),
        }
    }

    pub fn normalize_all(&self, records: &[RawEventRecord]) -> Vec<PlaceCardData> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.normalize(record, index))
            .collect()
    }

    // Latitude decides; a missing longitude borrows the fallback component.
    fn coordinates(&self, record: &RawEventRecord) -> Coordinates {
        let Some(latitude) = record.latitude.filter(|v| v.is_finite()) else {
            return self.fallback;
        };
        let longitude = record
            .longitude
            .filter(|v| v.is_finite())
            .unwrap_or(self.fallback.longitude);
        let coordinates = Coordinates::new(latitude, longitude);
        if coordinates.is_valid() {
            coordinates
        } else {
            self.fallback
        }
    }
}

// Blank keywords would hit the bare photo endpoint; use the name instead.
fn image_keywords(record: &RawEventRecord) -> &str {
    non_empty(Some(record.image_keywords.as_str()))
        .or_else(|| non_empty(Some(record.name.as_str())))
        .unwrap_or(DEFAULT_IMAGE_KEYWORDS)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_common::TRIVANDRUM;
    use serde_json::json;

    fn normalizer() -> PlaceNormalizer {
        PlaceNormalizer::new(
            TRIVANDRUM,
            ImageSearch::new("https://loremflickr.com/800/600").unwrap(),
        )
    }

    fn minimal_record() -> RawEventRecord {
        serde_json::from_value(json!({
            "name": "Attukal Pongala",
            "type": "Festival",
            "snippet": "Lakhs of women cook pongala along the streets. Free.",
            "location": "Attukal Bhagavathy Temple",
            "timing": "WEEKEND",
            "sourceLink": "https://example.com/pongala",
            "imageKeywords": "clay pots street fire festival"
        }))
        .unwrap()
    }

    #[test]
    fn missing_optionals_get_defaults() {
        let place = normalizer().normalize(&minimal_record(), 0);
        assert_eq!(place.rating, "Verified");
        assert_eq!(place.coordinates, Some(TRIVANDRUM));
        assert_eq!(place.description.as_deref(), Some("Source: Local Verification"));
        assert_eq!(place.timing, Some(Timing::Weekend));
        assert!(place.accent_color.is_none());
    }

    #[test]
    fn present_fields_are_carried() {
        let mut record = minimal_record();
        record.rating = Some("4.8".into());
        record.latitude = Some(8.4905);
        record.longitude = Some(76.9490);
        record.source_name = Some("BookMyShow".into());
        record.accent_color = Some("#FF5733".into());

        let place = normalizer().normalize(&record, 3);
        assert_eq!(place.rating, "4.8");
        assert_eq!(place.coordinates, Some(Coordinates::new(8.4905, 76.9490)));
        assert_eq!(place.description.as_deref(), Some("Source: BookMyShow"));
        assert_eq!(place.uri.as_deref(), Some("https://example.com/pongala"));
        assert_eq!(place.location.as_deref(), Some("Attukal Bhagavathy Temple"));
        assert_eq!(place.accent_color.as_deref(), Some("#FF5733"));
        assert!(place.id.starts_with("tvm-event-3-"));
        assert_eq!(
            place.image_url.as_deref(),
            Some("https://loremflickr.com/800/600/clay%20pots%20street%20fire%20festival?lock=3")
        );
    }

    #[test]
    fn blank_rating_falls_back_to_verified() {
        let mut record = minimal_record();
        record.rating = Some("   ".into());
        assert_eq!(normalizer().normalize(&record, 0).rating, "Verified");
    }

    #[test]
    fn latitude_without_longitude_borrows_fallback_longitude() {
        let mut record = minimal_record();
        record.latitude = Some(8.5);
        let place = normalizer().normalize(&record, 0);
        assert_eq!(
            place.coordinates,
            Some(Coordinates::new(8.5, TRIVANDRUM.longitude))
        );
    }

    #[test]
    fn longitude_alone_is_ignored() {
        let mut record = minimal_record();
        record.longitude = Some(77.0);
        assert_eq!(normalizer().normalize(&record, 0).coordinates, Some(TRIVANDRUM));
    }

    #[test]
    fn out_of_range_coordinates_fall_back() {
        let mut record = minimal_record();
        record.latitude = Some(120.0);
        record.longitude = Some(76.9);
        assert_eq!(normalizer().normalize(&record, 0).coordinates, Some(TRIVANDRUM));
    }

    #[test]
    fn unknown_timing_becomes_none() {
        let mut record = minimal_record();
        record.timing = "TOMORROW".into();
        assert_eq!(normalizer().normalize(&record, 0).timing, None);
    }

    #[test]
    fn renormalizing_is_stable_except_id() {
        let normalizer = normalizer();
        let record = minimal_record();
        let mut first = normalizer.normalize(&record, 4);
        let mut second = normalizer.normalize(&record, 4);
        assert_eq!(first.image_url, second.image_url);
        first.id.clear();
        second.id.clear();
        assert_eq!(first, second);
    }

    #[test]
    fn identical_keywords_get_distinct_images() {
        let records = vec![minimal_record(), minimal_record()];
        let places = normalizer().normalize_all(&records);
        assert_ne!(places[0].image_url, places[1].image_url);
        assert_ne!(places[0].id, places[1].id);
    }

    #[test]
    fn feed_response_accepts_stringified_events() {
        let inner = serde_json::to_string(&vec![minimal_record()]).unwrap();
        let response: FeedResponse = serde_json::from_value(json!({ "events": inner })).unwrap();
        assert_eq!(response.events.len(), 1);
    }

    #[test]
    fn feed_response_drops_only_nameless_or_non_object_records() {
        let response: FeedResponse = serde_json::from_value(json!({
            "events": [
                serde_json::to_value(minimal_record()).unwrap(),
                {"name": "half a record"},
                {"type": "Concert", "snippet": "no name"},
                "not even an object"
            ]
        }))
        .unwrap();
        let names: Vec<&str> = response.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Attukal Pongala", "half a record"]);
    }

    #[test]
    fn partial_record_survives_with_defaults() {
        let response: FeedResponse = serde_json::from_value(json!({
            "events": [{
                "name": "Kanakakkunnu Night Market",
                "type": "Market",
                "location": "Kanakakkunnu Palace",
                "timing": "WEEKEND",
                "sourceLink": "https://example.com/market",
                "imageKeywords": "night market lanterns"
            }]
        }))
        .unwrap();
        assert_eq!(response.events.len(), 1);

        let place = normalizer().normalize(&response.events[0], 0);
        assert_eq!(place.snippet, "");
        assert_eq!(place.rating, "Verified");
        assert_eq!(place.coordinates, Some(TRIVANDRUM));
    }

    #[test]
    fn name_only_record_gets_every_default() {
        let record: RawEventRecord =
            serde_json::from_value(json!({ "name": "Vellayani Lake Kayaking" })).unwrap();
        let place = normalizer().normalize(&record, 2);
        assert_eq!(place.category, "Event");
        assert_eq!(place.timing, None);
        assert_eq!(place.location, None);
        assert_eq!(place.uri, None);
        assert_eq!(
            place.image_url.as_deref(),
            Some("https://loremflickr.com/800/600/Vellayani%20Lake%20Kayaking?lock=2")
        );
    }

    #[test]
    fn stringified_coordinates_and_numeric_rating_are_read() {
        let response: FeedResponse = serde_json::from_value(json!({
            "events": [{
                "name": "Kovalam Surf Meet",
                "type": "Sports",
                "rating": 4.5,
                "snippet": "Beginner sessions at dawn",
                "location": "Lighthouse Beach",
                "timing": "NOW",
                "latitude": "8.3833",
                "longitude": " 76.9784 ",
                "sourceLink": "https://example.com/surf",
                "imageKeywords": "surfboard waves lighthouse"
            }]
        }))
        .unwrap();
        assert_eq!(response.events.len(), 1);

        let place = normalizer().normalize(&response.events[0], 0);
        assert_eq!(place.coordinates, Some(Coordinates::new(8.3833, 76.9784)));
        assert_eq!(place.rating, "4.5");
    }

    #[test]
    fn garbage_coordinates_fall_back_without_dropping_record() {
        let response: FeedResponse = serde_json::from_value(json!({
            "events": [{ "name": "Museum Walk", "latitude": "north", "longitude": [1] }]
        }))
        .unwrap();
        assert_eq!(response.events.len(), 1);
        assert_eq!(
            normalizer().normalize(&response.events[0], 0).coordinates,
            Some(TRIVANDRUM)
        );
    }

    #[test]
    fn schema_still_requires_core_fields() {
        use ai_client::StructuredOutput;
        let schema = FeedResponse::gemini_schema();
        let required = schema["properties"]["events"]["items"]["required"]
            .as_array()
            .unwrap();
        for field in ["name", "type", "snippet", "location", "timing", "sourceLink", "imageKeywords"] {
            assert!(required.iter().any(|r| r == field), "{field} not required");
        }
        assert!(!required.iter().any(|r| r == "latitude"));
    }

    #[test]
    fn feed_response_null_or_missing_events_is_empty() {
        let response: FeedResponse = serde_json::from_value(json!({ "events": null })).unwrap();
        assert!(response.events.is_empty());
        let response: FeedResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.events.is_empty());
    }
}
