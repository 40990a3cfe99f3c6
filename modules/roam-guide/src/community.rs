//! Community-submitted events: votes and comments.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use roam_common::{Comment, CommunityEvent, RoamError, Vote};

use crate::voting::{apply_vote, CommentGate, VotePolicy};

const LOCAL_AUTHOR: &str = "You";

#[derive(Debug, Clone, PartialEq)]
pub struct CommunityBoard {
    events: Vec<CommunityEvent>,
    policy: VotePolicy,
}

impl CommunityBoard {
    pub fn new(events: Vec<CommunityEvent>, policy: VotePolicy) -> Self {
        Self { events, policy }
    }

    /// Startup sample board, timestamps relative to `now_ms`.
    pub fn seeded(now_ms: i64, policy: VotePolicy) -> Self {
        Self::new(seed_events(now_ms), policy)
    }

    pub fn events(&self) -> &[CommunityEvent] {
        &self.events
    }

    pub fn get(&self, event_id: &str) -> Option<&CommunityEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn policy(&self) -> VotePolicy {
        self.policy
    }

    pub fn vote(&mut self, event_id: &str, vote: Vote) -> Result<&CommunityEvent, RoamError> {
        let event = self.get_mut(event_id)?;
        let outcome = apply_vote(event.votes, event.is_user_voted, vote);
        event.votes = outcome.votes;
        event.is_user_voted = outcome.state;
        info!(event_id, votes = event.votes, state = ?event.is_user_voted, "Vote applied");
        Ok(&*event)
    }

    /// Append a comment authored by this client. Gate state is not checked
    /// here; the board only guards data integrity.
    pub fn add_comment(&mut self, event_id: &str, text: &str) -> Result<&Comment, RoamError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RoamError::Validation("comment text is empty".into()));
        }
        let event = self.get_mut(event_id)?;
        let now = Utc::now();
        event.comments.push(Comment {
            id: format!("new-com-{}", now.timestamp_millis()),
            author: LOCAL_AUTHOR.to_string(),
            text: text.to_string(),
            timestamp: now,
        });
        info!(event_id, comments = event.comments.len(), "Comment added");
        event
            .comments
            .last()
            .ok_or_else(|| RoamError::NotFound(format!("comment on {event_id}")))
    }

    pub fn comment_gate(&self, event_id: &str) -> Result<CommentGate, RoamError> {
        let event = self
            .get(event_id)
            .ok_or_else(|| RoamError::NotFound(format!("community event {event_id}")))?;
        Ok(self.policy.comment_gate(event.votes, event.comments.len()))
    }

    /// Listing order: most votes first, ties keep board order.
    pub fn sorted_by_votes(&self) -> Vec<&CommunityEvent> {
        let mut sorted: Vec<&CommunityEvent> = self.events.iter().collect();
        sorted.sort_by(|a, b| b.votes.cmp(&a.votes));
        sorted
    }

    fn get_mut(&mut self, event_id: &str) -> Result<&mut CommunityEvent, RoamError> {
        self.events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| RoamError::NotFound(format!("community event {event_id}")))
    }
}

fn seed_events(now_ms: i64) -> Vec<CommunityEvent> {
    let now = DateTime::<Utc>::from_timestamp_millis(now_ms).unwrap_or_default();
    let comment = |id: &str, author: &str, text: &str| Comment {
        id: id.to_string(),
        author: author.to_string(),
        text: text.to_string(),
        timestamp: now,
    };

    vec![
        CommunityEvent {
            id: "tvm-c1".into(),
            title: "Manaveeyam Veedhi Sunday Market".into(),
            description: "Is the flea market happening this Sunday? Heard some rumors about a venue change.".into(),
            location: "Manaveeyam Veedhi, Vellayambalam".into(),
            time: "Sunday Morning".into(),
            author: "Arjun_TVM".into(),
            votes: 12,
            comments: vec![
                comment("com-1", "Rahul K.", "Yes, it is on! Just passed by, they are setting up."),
                comment("com-2", "Sneha", "Parking is tight near the museum, try the side lanes."),
            ],
            is_user_voted: None,
            timestamp: now_ms - Duration::hours(1).num_milliseconds(),
        },
        CommunityEvent {
            id: "tvm-c2".into(),
            title: "Lulu Mall Concert Entry".into(),
            description: "Does anyone know if the North entry is open for the music fest today? The main gate is jammed.".into(),
            location: "Lulu Mall, Akkulam".into(),
            time: "Today 6:00 PM".into(),
            author: "Meera_Nair".into(),
            votes: 4,
            comments: Vec::new(),
            is_user_voted: None,
            timestamp: now_ms - Duration::hours(2).num_milliseconds(),
        },
        CommunityEvent {
            id: "tvm-c3".into(),
            title: "Technopark Food Fest".into(),
            description: "Amazing Malabar biryani stall near Phase 3 today. Must try!".into(),
            location: "Technopark Phase 3".into(),
            time: "Ongoing".into(),
            author: "Dev_Coder".into(),
            votes: 28,
            comments: vec![comment("com-3", "Anish", "The line is super long now but worth it.")],
            is_user_voted: Some(Vote::Up),
            timestamp: now_ms - 10_000_000,
        },
    ]
}
