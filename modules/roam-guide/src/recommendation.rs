//! Recommendation block parser.
//!
//! A conversational reply may smuggle one structured recommendation inside
//! free text:
//!
//! ```text
//! Here is something fun tonight.
//! ---REC---
//! NAME: Jazz Night
//! LOCATION: Cafe X
//! LAT: 8.50
//! ---END---
//! ```
//!
//! The grammar is closed and unescaped. Parsing is line-oriented, labels are
//! case-sensitive, and every field has a default, so a block never fails to
//! parse. Defaults live in one place: [`RecommendationFields::from_scan`].

use std::collections::HashMap;

use roam_common::{Coordinates, PlaceCardData, Timing, DEFAULT_RATING};

use crate::image_search::ImageSearch;

pub const REC_OPEN: &str = "---REC---";
pub const REC_CLOSE: &str = "---END---";

const DEFAULT_NAME: &str = "Event";
const DEFAULT_TYPE: &str = "Event";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Name,
    Type,
    Location,
    Snippet,
    Url,
    Lat,
    Lng,
    Tags,
}

impl Label {
    pub const ALL: [Label; 8] = [
        Label::Name,
        Label::Type,
        Label::Location,
        Label::Snippet,
        Label::Url,
        Label::Lat,
        Label::Lng,
        Label::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Name => "NAME",
            Label::Type => "TYPE",
            Label::Location => "LOCATION",
            Label::Snippet => "SNIPPET",
            Label::Url => "URL",
            Label::Lat => "LAT",
            Label::Lng => "LNG",
            Label::Tags => "TAGS",
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            Label::Name => "[Event Name]",
            Label::Type => "[Category]",
            Label::Location => "[Venue]",
            Label::Snippet => "[Desc + Date]",
            Label::Url => "[Ticketing/Info Link]",
            Label::Lat => "[Latitude]",
            Label::Lng => "[Longitude]",
            Label::Tags => "[3-4 specific visual keywords]",
        }
    }
}

/// The block template as it appears in the system instruction.
pub fn block_template() -> String {
    let mut out = String::from(REC_OPEN);
    for label in Label::ALL {
        out.push('\n');
        out.push_str(label.as_str());
        out.push_str(": ");
        out.push_str(label.hint());
    }
    out.push('\n');
    out.push_str(REC_CLOSE);
    out
}

/// Values substituted for absent or unusable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationDefaults {
    pub place_name: String,
    pub coordinates: Coordinates,
    pub keyword: String,
}

impl RecommendationDefaults {
    pub fn for_city(city_name: &str, coordinates: Coordinates) -> Self {
        Self {
            place_name: city_name.to_string(),
            coordinates,
            keyword: city_name.to_lowercase(),
        }
    }
}

/// A parsed block with every default already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationFields {
    pub name: String,
    pub category: String,
    pub location: String,
    pub snippet: String,
    pub url: String,
    pub coordinates: Coordinates,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    NoRecommendation,
    Recommendation(RecommendationFields),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Text before the opening marker, trimmed.
    pub prose: String,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone)]
pub struct RecommendationParser {
    defaults: RecommendationDefaults,
}

impl RecommendationParser {
    pub fn new(defaults: RecommendationDefaults) -> Self {
        Self { defaults }
    }

    pub fn parse(&self, text: &str) -> ParsedReply {
        let Some((prose, rest)) = text.split_once(REC_OPEN) else {
            return ParsedReply {
                prose: text.trim().to_string(),
                recommendation: Recommendation::NoRecommendation,
            };
        };

        // An unterminated block runs to the end of the reply.
        let block = rest
            .split_once(REC_CLOSE)
            .map(|(block, _)| block)
            .unwrap_or(rest);

        ParsedReply {
            prose: prose.trim().to_string(),
            recommendation: Recommendation::Recommendation(RecommendationFields::from_scan(
                &scan_fields(block),
                &self.defaults,
            )),
        }
    }
}

/// First occurrence of each label wins; unknown lines are ignored.
fn scan_fields(block: &str) -> HashMap<Label, String> {
    let mut fields = HashMap::new();
    for line in block.lines() {
        if let Some((label, value)) = match_line(line) {
            fields.entry(label).or_insert(value);
        }
    }
    fields
}

fn match_line(line: &str) -> Option<(Label, String)> {
    // Models like to bold labels: "**NAME:** Jazz Night".
    let line = line.trim_start_matches(|c: char| c.is_whitespace() || c == '*');
    Label::ALL.into_iter().find_map(|label| {
        let rest = line.strip_prefix(label.as_str())?;
        let value = rest.trim_start_matches('*').strip_prefix(':')?;
        let value = clean_value(value);
        (!value.is_empty()).then_some((label, value))
    })
}

fn clean_value(raw: &str) -> String {
    raw.replace('*', "").trim().to_string()
}

/// Longest numeric prefix of `raw`, so `8.4833° N` and `8.4833,` both read
/// as 8.4833. No digits means no number.
fn leading_float(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while bytes.get(at).is_some_and(u8::is_ascii_digit) {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || has_digits {
            has_digits |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

impl RecommendationFields {
    pub fn from_scan(fields: &HashMap<Label, String>, defaults: &RecommendationDefaults) -> Self {
        let text = |label: Label, default: &str| -> String {
            fields
                .get(&label)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let number = |label: Label, default: f64, range: std::ops::RangeInclusive<f64>| -> f64 {
            fields
                .get(&label)
                .and_then(|raw| leading_float(raw))
                .filter(|v| v.is_finite() && range.contains(v))
                .unwrap_or(default)
        };

        Self {
            name: text(Label::Name, DEFAULT_NAME),
            category: text(Label::Type, DEFAULT_TYPE),
            location: text(Label::Location, &defaults.place_name),
            snippet: text(Label::Snippet, ""),
            url: text(Label::Url, ""),
            coordinates: Coordinates::new(
                number(Label::Lat, defaults.coordinates.latitude, -90.0..=90.0),
                number(Label::Lng, defaults.coordinates.longitude, -180.0..=180.0),
            ),
            tags: text(Label::Tags, &defaults.keyword),
        }
    }

    /// Card for the chat bubble. `stamp_millis` feeds both the id and the
    /// image slot.
    pub fn into_place(self, images: &ImageSearch, stamp_millis: i64) -> PlaceCardData {
        PlaceCardData {
            id: format!("tvm-chat-rec-{stamp_millis}"),
            image_url: Some(images.url_for(&self.tags, stamp_millis)),
            name: self.name,
            category: self.category,
            rating: DEFAULT_RATING.to_string(),
            snippet: self.snippet,
            location: Some(self.location),
            uri: (!self.url.is_empty()).then_some(self.url),
            timing: Some(Timing::Now),
            description: None,
            coordinates: Some(self.coordinates),
            accent_color: None,
        }
    }
}
