//! ELO rating deltas.
//!
//! Every function here is pure: cascade replays depend on getting bit-identical results for the
//! same inputs.

/// Sensitivity of a single result.
pub const K_FACTOR: f64 = 32.0;

/// How raw deltas are turned into applied deltas.
///
/// Deltas are always rounded to the nearest integer independently per side, so the two sides of
/// a solo match need not sum to zero. When `floor` is set, a delta that would take a rating below
/// it is replaced by `floor - rating` for that side only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingPolicy {
    pub floor: Option<f64>,
}

impl RatingPolicy {
    pub const fn unbounded() -> Self {
        Self { floor: None }
    }

    pub const fn with_floor(floor: f64) -> Self {
        Self { floor: Some(floor) }
    }

    fn finish(&self, rating: f64, raw_delta: f64) -> f64 {
        let delta = raw_delta.round();
        match self.floor {
            Some(floor) if rating + delta < floor => floor - rating,
            _ => delta,
        }
    }
}

/// Probability-like expected score of `rating` against `opponent`.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

fn actual_score(won: bool) -> f64 {
    if won {
        1.0
    } else {
        0.0
    }
}

/// Unrounded solo deltas `(delta_a, delta_b)`.
pub fn raw_solo_delta(rating_a: f64, rating_b: f64, winner_is_a: bool) -> (f64, f64) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;
    (
        K_FACTOR * (actual_score(winner_is_a) - expected_a),
        K_FACTOR * (actual_score(!winner_is_a) - expected_b),
    )
}

/// Applied solo deltas `(delta_a, delta_b)` under `policy`.
pub fn solo_delta(
    rating_a: f64,
    rating_b: f64,
    winner_is_a: bool,
    policy: RatingPolicy,
) -> (f64, f64) {
    let (raw_a, raw_b) = raw_solo_delta(rating_a, rating_b, winner_is_a);
    (policy.finish(rating_a, raw_a), policy.finish(rating_b, raw_b))
}

/// One player's delta in a team match, scored against the opposing pair's average.
pub fn team_delta(
    player_rating: f64,
    opponent_team_average: f64,
    is_winner: bool,
    policy: RatingPolicy,
) -> f64 {
    let raw = K_FACTOR * (actual_score(is_winner) - expected_score(player_rating, opponent_team_average));
    policy.finish(player_rating, raw)
}

pub fn team_average(player1: f64, player2: f64) -> f64 {
    (player1 + player2) / 2.0
}

/// A team's own rating change: the mean of its two players' deltas.
pub fn team_elo_change(delta1: f64, delta2: f64) -> f64 {
    (delta1 + delta2) / 2.0
}

/// Deltas of all four players of a team match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamDeltas {
    pub team1: [f64; 2],
    pub team2: [f64; 2],
}

impl TeamDeltas {
    pub fn team1_change(&self) -> f64 {
        team_elo_change(self.team1[0], self.team1[1])
    }

    pub fn team2_change(&self) -> f64 {
        team_elo_change(self.team2[0], self.team2[1])
    }
}

/// Score a team match from the four players' current team-ladder ratings.
pub fn team_deltas(
    team1: [f64; 2],
    team2: [f64; 2],
    team1_won: bool,
    policy: RatingPolicy,
) -> TeamDeltas {
    let team1_avg = team_average(team1[0], team1[1]);
    let team2_avg = team_average(team2[0], team2[1]);
    TeamDeltas {
        team1: team1.map(|r| team_delta(r, team2_avg, team1_won, policy)),
        team2: team2.map(|r| team_delta(r, team1_avg, !team1_won, policy)),
    }
}
