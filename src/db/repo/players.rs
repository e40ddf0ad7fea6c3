//! Player aggregate reads and delta updates.
//!
//! Every function here runs on a caller-supplied connection so the lifecycle engine can chain
//! them inside one transaction and observe its own writes.

use crate::domain::{Ladder, PlayerAggregate, PlayerId, RatingTrack, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const PLAYER_COLUMNS: &str = "id, username, rating, rank, total_matches, wins, losses, \
     team_rating, team_rank, team_total_matches, team_wins, team_losses, \
     current_win_streak, best_win_streak, created_at";

fn player_from_row(row: &SqliteRow) -> Result<PlayerAggregate, sqlx::Error> {
    Ok(PlayerAggregate {
        id: PlayerId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        solo: RatingTrack {
            rating: row.try_get("rating")?,
            rank: row.try_get("rank")?,
            total_matches: row.try_get("total_matches")?,
            wins: row.try_get("wins")?,
            losses: row.try_get("losses")?,
        },
        team: RatingTrack {
            rating: row.try_get("team_rating")?,
            rank: row.try_get("team_rank")?,
            total_matches: row.try_get("team_total_matches")?,
            wins: row.try_get("team_wins")?,
            losses: row.try_get("team_losses")?,
        },
        current_win_streak: row.try_get("current_win_streak")?,
        best_win_streak: row.try_get("best_win_streak")?,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

/// Fails with `RowNotFound` when an update touched nothing.
fn expect_one(rows_affected: u64) -> Result<(), sqlx::Error> {
    if rows_affected == 0 {
        Err(sqlx::Error::RowNotFound)
    } else {
        Ok(())
    }
}

pub async fn insert_player(
    conn: &mut SqliteConnection,
    username: &str,
    created_at: TimeMs,
) -> Result<PlayerAggregate, sqlx::Error> {
    let result = sqlx::query("INSERT INTO players (username, created_at) VALUES (?, ?)")
        .bind(username)
        .bind(created_at.as_i64())
        .execute(&mut *conn)
        .await?;

    let id = PlayerId::new(result.last_insert_rowid());
    fetch_player(conn, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_player(
    conn: &mut SqliteConnection,
    id: PlayerId,
) -> Result<Option<PlayerAggregate>, sqlx::Error> {
    let sql = format!("SELECT {} FROM players WHERE id = ?", PLAYER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(player_from_row).transpose()
}

/// Current rating of `id` on `ladder`, or `None` for an unknown player.
pub async fn fetch_rating(
    conn: &mut SqliteConnection,
    id: PlayerId,
    ladder: Ladder,
) -> Result<Option<f64>, sqlx::Error> {
    let sql = format!("SELECT {} AS r FROM players WHERE id = ?", ladder.columns().rating);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| r.try_get::<f64, _>("r")).transpose()
}

/// Like [`fetch_rating`] but treats a missing player as a storage fault.
pub async fn require_rating(
    conn: &mut SqliteConnection,
    id: PlayerId,
    ladder: Ladder,
) -> Result<f64, sqlx::Error> {
    fetch_rating(conn, id, ladder)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// All players ordered by rank on `ladder`, then id.
pub async fn list_by_rank(
    conn: &mut SqliteConnection,
    ladder: Ladder,
) -> Result<Vec<PlayerAggregate>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM players ORDER BY {} ASC, id ASC",
        PLAYER_COLUMNS,
        ladder.columns().rank
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(player_from_row).collect()
}

/// `rating += delta` on one ladder.
pub async fn adjust_rating(
    conn: &mut SqliteConnection,
    id: PlayerId,
    ladder: Ladder,
    delta: f64,
) -> Result<(), sqlx::Error> {
    let column = ladder.columns().rating;
    let sql = format!("UPDATE players SET {c} = {c} + ? WHERE id = ?", c = column);
    let result = sqlx::query(&sql)
        .bind(delta)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    expect_one(result.rows_affected())
}

/// Count (`step = 1`) or uncount (`step = -1`) one outcome on a ladder.
pub async fn record_outcome(
    conn: &mut SqliteConnection,
    id: PlayerId,
    ladder: Ladder,
    won: bool,
    step: i64,
) -> Result<(), sqlx::Error> {
    let cols = ladder.columns();
    let tally = if won { cols.wins } else { cols.losses };
    let sql = format!(
        "UPDATE players SET {t} = {t} + ?, {o} = {o} + ? WHERE id = ?",
        t = cols.total_matches,
        o = tally
    );
    let result = sqlx::query(&sql)
        .bind(step)
        .bind(step)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    expect_one(result.rows_affected())
}

/// Extend the winner's streak (raising the best if needed) or reset the loser's.
pub async fn bump_streak(
    conn: &mut SqliteConnection,
    id: PlayerId,
    won: bool,
) -> Result<(), sqlx::Error> {
    let sql = if won {
        "UPDATE players SET current_win_streak = current_win_streak + 1, \
         best_win_streak = MAX(best_win_streak, current_win_streak + 1) WHERE id = ?"
    } else {
        "UPDATE players SET current_win_streak = 0 WHERE id = ?"
    };
    let result = sqlx::query(sql)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    expect_one(result.rows_affected())
}

pub async fn set_streaks(
    conn: &mut SqliteConnection,
    id: PlayerId,
    current: i64,
    best: i64,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "UPDATE players SET current_win_streak = ?, best_win_streak = ? WHERE id = ?",
    )
    .bind(current)
    .bind(best)
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    expect_one(result.rows_affected())
}

/// One row of the rank population: `(id, rating, stored rank)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedRow {
    pub id: i64,
    pub rating: f64,
    pub rank: i64,
}

pub async fn rank_population(
    conn: &mut SqliteConnection,
    ladder: Ladder,
) -> Result<Vec<RankedRow>, sqlx::Error> {
    let cols = ladder.columns();
    let sql = format!(
        "SELECT id, {} AS r, {} AS k FROM players",
        cols.rating, cols.rank
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| {
            Ok(RankedRow {
                id: row.try_get("id")?,
                rating: row.try_get("r")?,
                rank: row.try_get("k")?,
            })
        })
        .collect()
}

pub async fn set_rank(
    conn: &mut SqliteConnection,
    id: i64,
    ladder: Ladder,
    rank: i64,
) -> Result<(), sqlx::Error> {
    let sql = format!("UPDATE players SET {} = ? WHERE id = ?", ladder.columns().rank);
    let result = sqlx::query(&sql)
        .bind(rank)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    expect_one(result.rows_affected())
}
