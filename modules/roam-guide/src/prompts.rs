use roam_common::{Coordinates, UserPreferences};

use crate::recommendation::block_template;

const DEFAULT_INTERESTS: &str = "Festivals, Music, Arts, Food, Workshops";

/// Search-grounded query for the home feed.
pub fn feed_prompt(
    city_name: &str,
    location: Coordinates,
    preferences: &UserPreferences,
) -> String {
    let interests = match preferences.activity_type.trim() {
        "" => DEFAULT_INTERESTS,
        interests => interests,
    };

    format!(
        r#"FIND REAL LIVE EVENTS in {city_name} for TODAY, THIS WEEK, and THIS WEEKEND.
Prefer events close to latitude {lat}, longitude {lng}.

SOURCES TO SEARCH:
- BookMyShow {city_name}
- Insider.in / Paytm Insider {city_name}
- Local Instagram event pages for {city_name}
- Local News: The Hindu ({city_name} Edition), New Indian Express

FILTER BY USER PREFERENCES:
Group: {group}
Budget: {budget}
Interests: {interests}

IMPORTANT: For each event, provide 3-4 HIGHLY SPECIFIC visual keywords for a search engine to find a matching photo.
Example: Instead of "food", use "kerala beef fry parotta restaurant". Instead of "concert", use "outdoor music stage blue neon lighting"."#,
        lat = location.latitude,
        lng = location.longitude,
        group = preferences.group,
        budget = preferences.budget,
    )
}

/// System instruction for chat. Teaches the recommendation block grammar.
pub fn chat_system_instruction(
    city_name: &str,
    location: Option<Coordinates>,
    preferences: &UserPreferences,
) -> String {
    let whereabouts = match location {
        Some(c) => format!("The user is near {}, {}.", c.latitude, c.longitude),
        None => format!("The user is somewhere in {city_name}."),
    };
    format!(
        r#"You are "Roam TVM", a local guide for {city_name}. If you mention a specific event, you MUST include a recommendation block.
{whereabouts} Travelling as: {group}. Budget: {budget}.
BE SPECIFIC with TAGS. If it's a beach event, use 'beach, ocean, sand, sunset'. If it's a cafe, use 'coffee, interior, cozy'.

{template}"#,
        group = preferences.group,
        budget = preferences.budget,
        template = block_template(),
    )
}
