//! Community voting state machine and the comment gate derived from it.
//!
//! Per event the client holds one of three vote states: none, up or down.
//! [`apply_vote`] is total over the 3x2 input space. A direct flip between
//! polarities swings the tally by two in a single step.

use std::fmt;

use roam_common::config::DEFAULT_COMMENT_UNLOCK_THRESHOLD;
use roam_common::Vote;

/// Vote count and this client's vote after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub votes: i64,
    pub state: Option<Vote>,
}

pub fn apply_vote(votes: i64, current: Option<Vote>, requested: Vote) -> VoteOutcome {
    match current {
        // Same button again: withdraw the earlier contribution.
        Some(prev) if prev == requested => VoteOutcome {
            votes: votes - requested.weight(),
            state: None,
        },
        None => VoteOutcome {
            votes: votes + requested.weight(),
            state: Some(requested),
        },
        Some(_) => VoteOutcome {
            votes: votes + 2 * requested.weight(),
            state: Some(requested),
        },
    }
}

/// Product constants for the comment gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotePolicy {
    pub unlock_threshold: i64,
}

impl Default for VotePolicy {
    fn default() -> Self {
        Self {
            unlock_threshold: DEFAULT_COMMENT_UNLOCK_THRESHOLD,
        }
    }
}

impl VotePolicy {
    pub fn new(unlock_threshold: i64) -> Self {
        Self { unlock_threshold }
    }

    /// Recomputed on every call; never cache the result.
    pub fn comment_gate(&self, votes: i64, comment_count: usize) -> CommentGate {
        if votes >= self.unlock_threshold {
            CommentGate::Unlocked { comment_count }
        } else {
            CommentGate::Locked {
                remaining: self.unlock_threshold - votes,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentGate {
    Locked { remaining: i64 },
    Unlocked { comment_count: usize },
}

impl CommentGate {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, CommentGate::Unlocked { .. })
    }
}

impl fmt::Display for CommentGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentGate::Locked { remaining } => {
                write!(f, "{remaining} more upvotes to unlock comments")
            }
            CommentGate::Unlocked { comment_count } => write!(f, "{comment_count} comments"),
        }
    }
}
