//! Rating ledger entries.

use crate::domain::{MatchId, MatchKind, PlayerId, TeamId, TimeMs};
use serde::Serialize;

/// Who a ledger entry's player played against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum Opponent {
    Player(PlayerId),
    Team(TeamId),
}

/// One player's rating change caused by one confirmed match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistoryEntry {
    pub player: PlayerId,
    pub match_id: MatchId,
    pub kind: MatchKind,
    pub rating_before: f64,
    pub rating_after: f64,
    pub rating_delta: f64,
    pub opponent: Opponent,
    /// Confirmation time of the match, preserved across cascade rewrites.
    pub created_at: TimeMs,
}

impl RatingHistoryEntry {
    pub fn new(
        player: PlayerId,
        match_id: MatchId,
        kind: MatchKind,
        rating_before: f64,
        rating_delta: f64,
        opponent: Opponent,
        created_at: TimeMs,
    ) -> Self {
        Self {
            player,
            match_id,
            kind,
            rating_before,
            rating_after: rating_before + rating_delta,
            rating_delta,
            opponent,
            created_at,
        }
    }
}
