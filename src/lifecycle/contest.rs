//! Per-ladder rating effects of a confirmed match.
//!
//! A solo match moves two players' solo tracks. A team match moves four players' team tracks
//! and both teams' aggregates, each team by the mean of its players' deltas.

use super::MatchError;
use crate::db::repo::{history, matches, players, teams};
use crate::domain::{
    Ladder, MatchRecord, Opponent, PartyId, PlayerId, RatingHistoryEntry, TeamAggregate, TeamId,
    TimeMs,
};
use crate::engine::{solo_delta, team_deltas, team_elo_change, RatingPolicy};
use async_trait::async_trait;
use sqlx::SqliteConnection;

/// Whether an application counts the outcome or only re-derives ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// First confirmation: ratings, counters and streaks.
    Fresh,
    /// Cascade replay: ratings and ledger only, the outcome is already counted.
    Replay,
}

/// A party type with a ladder of its own.
#[async_trait]
pub trait Contestant: PartyId {
    const LADDER: Ladder;

    /// Players fielded by `party`, or `None` if it does not exist.
    async fn roster(
        conn: &mut SqliteConnection,
        party: Self,
    ) -> Result<Option<Vec<PlayerId>>, sqlx::Error>;

    /// Write ledger rows for `record` from current ratings and add the deltas.
    async fn apply(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
        policy: RatingPolicy,
        pass: Pass,
    ) -> Result<(), MatchError>;

    /// Subtract the recorded deltas of `record`, leaving its ledger rows in place.
    async fn rewind(conn: &mut SqliteConnection, record: &MatchRecord<Self>)
        -> Result<(), MatchError>;

    /// Undo every effect of a confirmed match: ratings, counters and ledger rows.
    async fn retract(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError>;

    /// Runs once the match is tombstoned.
    async fn settle_deleted(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError>;
}

fn confirmation_time<P: PartyId>(record: &MatchRecord<P>) -> Result<TimeMs, MatchError> {
    record.confirmed_at.ok_or_else(|| {
        MatchError::Inconsistent(format!("{} is confirmed without a confirmation time", record.id))
    })
}

async fn recorded_entries<P: PartyId>(
    conn: &mut SqliteConnection,
    record: &MatchRecord<P>,
    expected: usize,
) -> Result<Vec<RatingHistoryEntry>, MatchError> {
    let entries = history::entries_for_match(conn, P::KIND, record.id).await?;
    if entries.len() != expected {
        return Err(MatchError::Inconsistent(format!(
            "{} has {} ledger rows, expected {}",
            record.id,
            entries.len(),
            expected
        )));
    }
    Ok(entries)
}

/// `(current, best)` win streaks of a chronological win/loss sequence.
pub fn win_streaks(results: &[bool]) -> (i64, i64) {
    let mut current = 0i64;
    let mut best = 0i64;
    for &won in results {
        current = if won { current + 1 } else { 0 };
        best = best.max(current);
    }
    (current, best)
}

#[async_trait]
impl Contestant for PlayerId {
    const LADDER: Ladder = Ladder::Solo;

    async fn roster(
        conn: &mut SqliteConnection,
        party: Self,
    ) -> Result<Option<Vec<PlayerId>>, sqlx::Error> {
        let rating = players::fetch_rating(conn, party, Ladder::Solo).await?;
        Ok(rating.map(|_| vec![party]))
    }

    async fn apply(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
        policy: RatingPolicy,
        pass: Pass,
    ) -> Result<(), MatchError> {
        let at = confirmation_time(record)?;
        let rating1 = players::require_rating(conn, record.side1, Ladder::Solo).await?;
        let rating2 = players::require_rating(conn, record.side2, Ladder::Solo).await?;
        let (delta1, delta2) = solo_delta(rating1, rating2, record.side1_won(), policy);

        for (player, opponent, before, delta) in [
            (record.side1, record.side2, rating1, delta1),
            (record.side2, record.side1, rating2, delta2),
        ] {
            let entry = RatingHistoryEntry::new(
                player,
                record.id,
                Self::KIND,
                before,
                delta,
                Opponent::Player(opponent),
                at,
            );
            history::insert_entry(conn, &entry).await?;
            players::adjust_rating(conn, player, Ladder::Solo, delta).await?;

            if pass == Pass::Fresh {
                let won = player == record.winner;
                players::record_outcome(conn, player, Ladder::Solo, won, 1).await?;
                players::bump_streak(conn, player, won).await?;
            }
        }
        Ok(())
    }

    async fn rewind(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        for entry in recorded_entries(conn, record, 2).await? {
            players::adjust_rating(conn, entry.player, Ladder::Solo, -entry.rating_delta).await?;
        }
        Ok(())
    }

    async fn retract(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        Self::rewind(conn, record).await?;
        for (player, won) in [(record.winner, true), (record.loser(), false)] {
            players::record_outcome(conn, player, Ladder::Solo, won, -1).await?;
        }
        history::delete_for_match(conn, Self::KIND, record.id).await?;
        Ok(())
    }

    async fn settle_deleted(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        for player in [record.side1, record.side2] {
            let results = matches::solo_results_for(conn, player).await?;
            let (current, best) = win_streaks(&results);
            players::set_streaks(conn, player, current, best).await?;
        }
        Ok(())
    }
}

async fn team_pair(
    conn: &mut SqliteConnection,
    record: &MatchRecord<TeamId>,
) -> Result<(TeamAggregate, TeamAggregate), MatchError> {
    let team1 = teams::require_team(conn, record.side1).await?;
    let team2 = teams::require_team(conn, record.side2).await?;
    Ok((team1, team2))
}

async fn team_ratings(
    conn: &mut SqliteConnection,
    team: &TeamAggregate,
) -> Result<[f64; 2], sqlx::Error> {
    let first = players::require_rating(conn, team.player1, Ladder::Team).await?;
    let second = players::require_rating(conn, team.player2, Ladder::Team).await?;
    Ok([first, second])
}

#[async_trait]
impl Contestant for TeamId {
    const LADDER: Ladder = Ladder::Team;

    async fn roster(
        conn: &mut SqliteConnection,
        party: Self,
    ) -> Result<Option<Vec<PlayerId>>, sqlx::Error> {
        let team = teams::fetch_team(conn, party).await?;
        Ok(team.map(|t| t.roster().to_vec()))
    }

    async fn apply(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
        policy: RatingPolicy,
        pass: Pass,
    ) -> Result<(), MatchError> {
        let at = confirmation_time(record)?;
        let (team1, team2) = team_pair(conn, record).await?;
        let ratings1 = team_ratings(conn, &team1).await?;
        let ratings2 = team_ratings(conn, &team2).await?;
        let side1_won = record.side1_won();
        let deltas = team_deltas(ratings1, ratings2, side1_won, policy);

        for (team, opponent, ratings, player_deltas, won) in [
            (&team1, team2.id, ratings1, deltas.team1, side1_won),
            (&team2, team1.id, ratings2, deltas.team2, !side1_won),
        ] {
            for ((player, before), delta) in team.roster().into_iter().zip(ratings).zip(player_deltas)
            {
                let entry = RatingHistoryEntry::new(
                    player,
                    record.id,
                    Self::KIND,
                    before,
                    delta,
                    Opponent::Team(opponent),
                    at,
                );
                history::insert_entry(conn, &entry).await?;
                players::adjust_rating(conn, player, Ladder::Team, delta).await?;
                if pass == Pass::Fresh {
                    players::record_outcome(conn, player, Ladder::Team, won, 1).await?;
                }
            }

            let change = team_elo_change(player_deltas[0], player_deltas[1]);
            teams::adjust_rating(conn, team.id, change).await?;
            if pass == Pass::Fresh {
                teams::record_outcome(conn, team.id, won, 1).await?;
            }
        }
        Ok(())
    }

    async fn rewind(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        let entries = recorded_entries(conn, record, 4).await?;
        let (team1, team2) = team_pair(conn, record).await?;

        for entry in &entries {
            players::adjust_rating(conn, entry.player, Ladder::Team, -entry.rating_delta).await?;
        }

        for team in [&team1, &team2] {
            let deltas: Vec<f64> = entries
                .iter()
                .filter(|e| team.roster().contains(&e.player))
                .map(|e| e.rating_delta)
                .collect();
            if deltas.len() != 2 {
                return Err(MatchError::Inconsistent(format!(
                    "{} has {} ledger rows for {}",
                    record.id,
                    deltas.len(),
                    team.id
                )));
            }
            teams::adjust_rating(conn, team.id, -team_elo_change(deltas[0], deltas[1])).await?;
        }
        Ok(())
    }

    async fn retract(
        conn: &mut SqliteConnection,
        record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        Self::rewind(conn, record).await?;
        let (team1, team2) = team_pair(conn, record).await?;

        for team in [&team1, &team2] {
            let won = team.id == record.winner;
            for player in team.roster() {
                players::record_outcome(conn, player, Ladder::Team, won, -1).await?;
            }
            teams::record_outcome(conn, team.id, won, -1).await?;
        }
        history::delete_for_match(conn, Self::KIND, record.id).await?;
        Ok(())
    }

    async fn settle_deleted(
        _conn: &mut SqliteConnection,
        _record: &MatchRecord<Self>,
    ) -> Result<(), MatchError> {
        Ok(())
    }
}
