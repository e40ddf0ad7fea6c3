//! Pure computation engine(s) for deterministic rating logic.

pub mod elo;
pub mod ranking;

pub use elo::{
    expected_score, solo_delta, team_average, team_delta, team_deltas, team_elo_change,
    RatingPolicy, TeamDeltas, K_FACTOR,
};
pub use ranking::competition_ranks;
