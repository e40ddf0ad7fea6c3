//! Match lifecycle: the pending/terminal state machine and the transactional application,
//! reversal and replay of rating effects.

mod cascade;
mod contest;
mod engine;
pub mod ranks;

pub use contest::{win_streaks, Contestant, Pass};
pub use engine::MatchEngine;

use crate::domain::{MatchId, MatchStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{id} is {actual}, expected {expected}")]
    InvalidTransition {
        id: MatchId,
        expected: MatchStatus,
        actual: MatchStatus,
    },
    #[error("winner {winner} is not a side of the match")]
    InvalidWinner { winner: String },
    #[error("duplicate party: {0}")]
    DuplicateParty(String),
    #[error("rating history is inconsistent: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}

impl MatchError {
    pub(crate) fn match_not_found(id: MatchId) -> Self {
        MatchError::NotFound {
            entity: "match",
            id: id.as_i64(),
        }
    }

    /// True when the request itself was invalid, false for internal failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MatchError::NotFound { .. }
                | MatchError::InvalidTransition { .. }
                | MatchError::InvalidWinner { .. }
                | MatchError::DuplicateParty(_)
        )
    }
}
