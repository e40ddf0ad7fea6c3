//! Team aggregate reads and delta updates.

use crate::domain::{PlayerId, TeamAggregate, TeamId, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn team_from_row(row: &SqliteRow) -> Result<TeamAggregate, sqlx::Error> {
    Ok(TeamAggregate {
        id: TeamId::new(row.try_get("id")?),
        player1: PlayerId::new(row.try_get("player1_id")?),
        player2: PlayerId::new(row.try_get("player2_id")?),
        name: row.try_get("name")?,
        rating: row.try_get("rating")?,
        total_matches: row.try_get("total_matches")?,
        wins: row.try_get("wins")?,
        losses: row.try_get("losses")?,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

pub async fn insert_team(
    conn: &mut SqliteConnection,
    player1: PlayerId,
    player2: PlayerId,
    name: Option<&str>,
    created_at: TimeMs,
) -> Result<TeamAggregate, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO teams (player1_id, player2_id, name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(player1.as_i64())
    .bind(player2.as_i64())
    .bind(name)
    .bind(created_at.as_i64())
    .execute(&mut *conn)
    .await?;

    fetch_team(conn, TeamId::new(result.last_insert_rowid()))
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_team(
    conn: &mut SqliteConnection,
    id: TeamId,
) -> Result<Option<TeamAggregate>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, player1_id, player2_id, name, rating, total_matches, wins, losses, created_at
        FROM teams
        WHERE id = ?
        "#,
    )
    .bind(id.as_i64())
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(team_from_row).transpose()
}

/// Team whose existence is already established by a stored match.
pub async fn require_team(
    conn: &mut SqliteConnection,
    id: TeamId,
) -> Result<TeamAggregate, sqlx::Error> {
    fetch_team(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn adjust_rating(
    conn: &mut SqliteConnection,
    id: TeamId,
    delta: f64,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query("UPDATE teams SET rating = rating + ? WHERE id = ?")
        .bind(delta)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn record_outcome(
    conn: &mut SqliteConnection,
    id: TeamId,
    won: bool,
    step: i64,
) -> Result<(), sqlx::Error> {
    let sql = if won {
        "UPDATE teams SET total_matches = total_matches + ?, wins = wins + ? WHERE id = ?"
    } else {
        "UPDATE teams SET total_matches = total_matches + ?, losses = losses + ? WHERE id = ?"
    };
    let result = sqlx::query(sql)
        .bind(step)
        .bind(step)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}
