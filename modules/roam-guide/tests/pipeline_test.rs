//! End-to-end tests for the feed and chat pipelines driven through
//! MockGenerator. No network.

use std::sync::Arc;

use ai_client::{GroundingChunk, MessageRole};
use roam_common::{Config, Coordinates, Role, Timing, UserPreferences, Vote, TRIVANDRUM};
use roam_guide::chat::{ChatService, FALLBACK_MESSAGE_ID, FALLBACK_TEXT};
use roam_guide::community::CommunityBoard;
use roam_guide::feed::FeedService;
use roam_guide::image_search::ImageSearch;
use roam_guide::normalizer::PlaceNormalizer;
use roam_guide::recommendation::{RecommendationDefaults, RecommendationParser};
use roam_guide::testing::{sample_feed_json, MockGenerator, RecordedCall};
use roam_guide::voting::{CommentGate, VotePolicy};
use roam_guide::{Action, App};

fn images() -> ImageSearch {
    ImageSearch::new("https://loremflickr.com/800/600").unwrap()
}

fn feed_service(generator: Arc<MockGenerator>) -> FeedService {
    FeedService::new(
        generator,
        PlaceNormalizer::new(TRIVANDRUM, images()),
        "Trivandrum",
    )
}

fn chat_service(generator: Arc<MockGenerator>) -> ChatService {
    ChatService::new(
        generator,
        RecommendationParser::new(RecommendationDefaults::for_city("Trivandrum", TRIVANDRUM)),
        images(),
        "Trivandrum",
    )
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_normalizes_structured_events() {
    let generator = Arc::new(MockGenerator::new().with_structured(sample_feed_json()));
    let places = feed_service(generator.clone())
        .fetch(TRIVANDRUM, &UserPreferences::default())
        .await;

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].name, "Nishagandhi Dance Festival");
    assert_eq!(places[0].rating, "4.7");
    assert_eq!(places[0].timing, Some(Timing::Week));
    assert_eq!(places[0].description.as_deref(), Some("Source: The Hindu"));
    assert_eq!(places[1].rating, "Verified");
    assert_eq!(places[1].coordinates, Some(TRIVANDRUM));
    assert!(places[1].image_url.as_deref().unwrap().ends_with("?lock=1"));

    match &generator.calls()[..] {
        [RecordedCall::Structured { prompt, schema }] => {
            assert!(prompt.contains("Interests: Festivals, Music, Arts, Food, Workshops"));
            assert!(schema["properties"]["events"].is_object());
        }
        other => panic!("unexpected calls {other:?}"),
    }
}

#[tokio::test]
async fn feed_accepts_fenced_json() {
    let fenced = format!("```json\n{}\n```", sample_feed_json());
    let generator = Arc::new(MockGenerator::new().with_structured(fenced));
    let places = feed_service(generator)
        .fetch(TRIVANDRUM, &UserPreferences::default())
        .await;
    assert_eq!(places.len(), 2);
}

#[tokio::test]
async fn feed_upstream_failure_is_empty() {
    let generator = Arc::new(MockGenerator::new().failing());
    let places = feed_service(generator)
        .fetch(TRIVANDRUM, &UserPreferences::default())
        .await;
    assert!(places.is_empty());
}

#[tokio::test]
async fn feed_unparsable_body_is_empty() {
    let generator = Arc::new(MockGenerator::new().with_structured("Sorry, I could not find events."));
    let places = feed_service(generator)
        .fetch(TRIVANDRUM, &UserPreferences::default())
        .await;
    assert!(places.is_empty());
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_reply_with_recommendation_and_sources() {
    let generator = Arc::new(MockGenerator::new().with_reply(
        "Hello\n---REC---\nNAME: Jazz Night\nLOCATION: Cafe X\n---END---",
        vec![
            GroundingChunk::web(Some("A"), Some("")),
            GroundingChunk::web(Some("B"), Some("http://x")),
        ],
    ));
    let message = chat_service(generator)
        .reply("any jazz tonight?", None, &UserPreferences::default(), &[])
        .await;

    assert_eq!(message.role, Role::Model);
    assert_eq!(message.text, "Hello");

    let place = message.recommended_place.expect("recommendation");
    assert_eq!(place.name, "Jazz Night");
    assert_eq!(place.location.as_deref(), Some("Cafe X"));
    assert_eq!(place.category, "Event");
    assert_eq!(place.coordinates, Some(TRIVANDRUM));
    assert!(place.id.starts_with("tvm-chat-rec-"));

    let sources = message.grounding_sources.expect("sources");
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].title, "B");
    assert_eq!(sources[0].uri, "http://x");
}

#[tokio::test]
async fn chat_plain_reply_has_no_card_or_sources() {
    let generator = Arc::new(MockGenerator::new().with_reply("  Try the Napier Museum.  ", vec![]));
    let message = chat_service(generator)
        .reply("museums?", None, &UserPreferences::default(), &[])
        .await;
    assert_eq!(message.text, "Try the Napier Museum.");
    assert!(message.recommended_place.is_none());
    assert!(message.grounding_sources.is_none());
}

#[tokio::test]
async fn chat_block_only_reply_gets_default_prose() {
    let generator = Arc::new(
        MockGenerator::new().with_reply("---REC---\nNAME: Onam Fest\nLAT: notanumber\n---END---", vec![]),
    );
    let message = chat_service(generator)
        .reply("onam?", None, &UserPreferences::default(), &[])
        .await;
    assert_eq!(message.text, "I found a great event for you!");
    let coordinates = message.recommended_place.unwrap().coordinates.unwrap();
    assert_eq!(coordinates.latitude, TRIVANDRUM.latitude);
}

#[tokio::test]
async fn chat_failure_yields_fallback_message() {
    let generator = Arc::new(MockGenerator::new().failing());
    let message = chat_service(generator)
        .reply("hello?", None, &UserPreferences::default(), &[])
        .await;
    assert_eq!(message.id, FALLBACK_MESSAGE_ID);
    assert_eq!(message.text, FALLBACK_TEXT);
    assert_eq!(message.role, Role::Model);
    assert!(message.recommended_place.is_none());
}

#[tokio::test]
async fn chat_replays_history_as_role_and_text() {
    let generator = Arc::new(MockGenerator::new().with_reply("Sure.", vec![]));
    let history = vec![
        roam_common::Message::user("beaches?"),
        roam_common::Message::model("1", "Kovalam is lovely.", None, None),
    ];
    let near = Coordinates::new(8.4, 76.98);
    chat_service(generator.clone())
        .reply("and tonight?", Some(near), &UserPreferences::default(), &history)
        .await;

    match &generator.calls()[..] {
        [RecordedCall::Converse {
            system_instruction,
            history,
            message,
        }] => {
            assert!(system_instruction.contains("---REC---"));
            assert!(system_instruction.contains("8.4, 76.98"));
            assert_eq!(message, "and tonight?");
            assert_eq!(history.len(), 2);
            assert_eq!(history[0].role, MessageRole::User);
            assert_eq!(history[1].role, MessageRole::Model);
            assert_eq!(history[1].content, "Kovalam is lovely.");
        }
        other => panic!("unexpected calls {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// App dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn app_location_resolution_loads_feed() {
    let generator = Arc::new(MockGenerator::new().with_structured(sample_feed_json()));
    let mut app = App::new(&Config::for_tests(), generator).unwrap();

    app.dispatch(Action::LocationResolved(None)).await.unwrap();

    let state = app.state();
    assert_eq!(state.location, Some(TRIVANDRUM));
    assert_eq!(state.feed.len(), 2);
    assert!(!state.feed_loading);
}

#[tokio::test]
async fn app_chat_round_trip_appends_both_messages() {
    let generator = Arc::new(MockGenerator::new().with_reply("Try the Napier Museum.", vec![]));
    let mut app = App::new(&Config::for_tests(), generator).unwrap();

    app.dispatch(Action::UserMessageSent("museums?".into()))
        .await
        .unwrap();

    let messages = &app.state().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].text, "Try the Napier Museum.");
    assert!(!app.state().chat_loading);
}

#[tokio::test]
async fn app_chat_failure_still_replies() {
    let generator = Arc::new(MockGenerator::new().failing());
    let mut app = App::new(&Config::for_tests(), generator).unwrap();

    app.dispatch(Action::UserMessageSent("hello".into()))
        .await
        .unwrap();

    assert_eq!(app.state().messages[1].text, FALLBACK_TEXT);
}

// ---------------------------------------------------------------------------
// Community
// ---------------------------------------------------------------------------

#[test]
fn comment_gate_unlocks_at_threshold() {
    let mut board = CommunityBoard::seeded(0, VotePolicy::default());
    let gate = board.comment_gate("tvm-c2").unwrap();
    assert_eq!(gate.to_string(), "1 more upvotes to unlock comments");

    board.vote("tvm-c2", Vote::Up).unwrap();
    assert_eq!(
        board.comment_gate("tvm-c2").unwrap(),
        CommentGate::Unlocked { comment_count: 0 }
    );

    board.add_comment("tvm-c2", "North gate is open now").unwrap();
    assert_eq!(
        board.comment_gate("tvm-c2").unwrap(),
        CommentGate::Unlocked { comment_count: 1 }
    );

    // Withdrawing the vote locks it again.
    board.vote("tvm-c2", Vote::Up).unwrap();
    assert_eq!(
        board.comment_gate("tvm-c2").unwrap(),
        CommentGate::Locked { remaining: 1 }
    );
}
