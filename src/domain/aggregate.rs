//! Per-player and per-team rating aggregates.

use crate::domain::{MatchKind, PlayerId, TeamId, TimeMs};
use serde::Serialize;

/// Rating every player and team starts from.
pub const INITIAL_RATING: f64 = 1200.0;

/// The two independent rating ladders a player competes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ladder {
    Solo,
    Team,
}

impl Ladder {
    /// Column names of this ladder's track in the `players` table.
    pub(crate) fn columns(&self) -> TrackColumns {
        match self {
            Ladder::Solo => TrackColumns {
                rating: "rating",
                rank: "rank",
                total_matches: "total_matches",
                wins: "wins",
                losses: "losses",
            },
            Ladder::Team => TrackColumns {
                rating: "team_rating",
                rank: "team_rank",
                total_matches: "team_total_matches",
                wins: "team_wins",
                losses: "team_losses",
            },
        }
    }
}

impl From<MatchKind> for Ladder {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::Solo => Ladder::Solo,
            MatchKind::Team => Ladder::Team,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TrackColumns {
    pub rating: &'static str,
    pub rank: &'static str,
    pub total_matches: &'static str,
    pub wins: &'static str,
    pub losses: &'static str,
}

/// One rating ladder's standing for a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingTrack {
    pub rating: f64,
    pub rank: i64,
    pub total_matches: i64,
    pub wins: i64,
    pub losses: i64,
}

impl Default for RatingTrack {
    fn default() -> Self {
        Self {
            rating: INITIAL_RATING,
            rank: 1,
            total_matches: 0,
            wins: 0,
            losses: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAggregate {
    pub id: PlayerId,
    pub username: String,
    pub solo: RatingTrack,
    pub team: RatingTrack,
    pub current_win_streak: i64,
    pub best_win_streak: i64,
    pub created_at: TimeMs,
}

impl PlayerAggregate {
    pub fn track(&self, ladder: Ladder) -> &RatingTrack {
        match ladder {
            Ladder::Solo => &self.solo,
            Ladder::Team => &self.team,
        }
    }
}

/// A fixed pair of players with its own rolled-up rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAggregate {
    pub id: TeamId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub name: Option<String>,
    pub rating: f64,
    pub total_matches: i64,
    pub wins: i64,
    pub losses: i64,
    pub created_at: TimeMs,
}

impl TeamAggregate {
    pub fn roster(&self) -> [PlayerId; 2] {
        [self.player1, self.player2]
    }

    pub fn shares_player_with(&self, other: &TeamAggregate) -> bool {
        self.roster().iter().any(|p| other.roster().contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, p1: i64, p2: i64) -> TeamAggregate {
        TeamAggregate {
            id: TeamId::new(id),
            player1: PlayerId::new(p1),
            player2: PlayerId::new(p2),
            name: None,
            rating: INITIAL_RATING,
            total_matches: 0,
            wins: 0,
            losses: 0,
            created_at: TimeMs::new(0),
        }
    }

    #[test]
    fn test_default_track_starts_at_initial_rating() {
        let track = RatingTrack::default();
        assert_eq!(track.rating, 1200.0);
        assert_eq!(track.rank, 1);
        assert_eq!(track.total_matches, 0);
    }

    #[test]
    fn test_ladder_columns_are_disjoint() {
        let solo = Ladder::Solo.columns();
        let team = Ladder::Team.columns();
        assert_ne!(solo.rating, team.rating);
        assert_ne!(solo.rank, team.rank);
        assert_eq!(Ladder::from(MatchKind::Team), Ladder::Team);
    }

    #[test]
    fn test_shares_player_with() {
        assert!(team(1, 1, 2).shares_player_with(&team(2, 2, 3)));
        assert!(!team(1, 1, 2).shares_player_with(&team(2, 3, 4)));
    }
}
