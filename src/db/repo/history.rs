//! Rating ledger rows.

use crate::domain::{MatchId, MatchKind, Opponent, PlayerId, RatingHistoryEntry, TeamId, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const ENTRY_COLUMNS: &str = "player_id, match_kind, match_id, rating_before, rating_after, \
     rating_delta, opponent_player_id, opponent_team_id, created_at";

fn entry_from_row(row: &SqliteRow) -> Result<RatingHistoryEntry, sqlx::Error> {
    let kind: String = row.try_get("match_kind")?;
    let kind = kind
        .parse::<MatchKind>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "match_kind".to_string(),
            source: e.into(),
        })?;

    let opponent_player: Option<i64> = row.try_get("opponent_player_id")?;
    let opponent_team: Option<i64> = row.try_get("opponent_team_id")?;
    let opponent = match (opponent_player, opponent_team) {
        (Some(id), None) => Opponent::Player(PlayerId::new(id)),
        (None, Some(id)) => Opponent::Team(TeamId::new(id)),
        _ => {
            return Err(sqlx::Error::ColumnDecode {
                index: "opponent_player_id".to_string(),
                source: "exactly one opponent column must be set".into(),
            })
        }
    };

    Ok(RatingHistoryEntry {
        player: PlayerId::new(row.try_get("player_id")?),
        match_id: MatchId::new(row.try_get("match_id")?),
        kind,
        rating_before: row.try_get("rating_before")?,
        rating_after: row.try_get("rating_after")?,
        rating_delta: row.try_get("rating_delta")?,
        opponent,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

pub async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &RatingHistoryEntry,
) -> Result<(), sqlx::Error> {
    let (opponent_player, opponent_team) = match entry.opponent {
        Opponent::Player(id) => (Some(id.as_i64()), None),
        Opponent::Team(id) => (None, Some(id.as_i64())),
    };

    sqlx::query(
        r#"
        INSERT INTO rating_history (
            player_id, match_kind, match_id, rating_before, rating_after, rating_delta,
            opponent_player_id, opponent_team_id, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.player.as_i64())
    .bind(entry.kind.as_str())
    .bind(entry.match_id.as_i64())
    .bind(entry.rating_before)
    .bind(entry.rating_after)
    .bind(entry.rating_delta)
    .bind(opponent_player)
    .bind(opponent_team)
    .bind(entry.created_at.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Ledger rows written for one match, in insertion order.
pub async fn entries_for_match(
    conn: &mut SqliteConnection,
    kind: MatchKind,
    match_id: MatchId,
) -> Result<Vec<RatingHistoryEntry>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM rating_history WHERE match_kind = ? AND match_id = ? ORDER BY id ASC",
        ENTRY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(kind.as_str())
        .bind(match_id.as_i64())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(entry_from_row).collect()
}

/// A player's trajectory, oldest first. `kind = None` returns both ladders.
pub async fn entries_for_player(
    conn: &mut SqliteConnection,
    player: PlayerId,
    kind: Option<MatchKind>,
) -> Result<Vec<RatingHistoryEntry>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM rating_history WHERE player_id = ? AND (? IS NULL OR match_kind = ?) \
         ORDER BY created_at ASC, match_id ASC",
        ENTRY_COLUMNS
    );
    let kind = kind.map(|k| k.as_str());
    let rows = sqlx::query(&sql)
        .bind(player.as_i64())
        .bind(kind)
        .bind(kind)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(entry_from_row).collect()
}

pub async fn delete_for_match(
    conn: &mut SqliteConnection,
    kind: MatchKind,
    match_id: MatchId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM rating_history WHERE match_kind = ? AND match_id = ?")
        .bind(kind.as_str())
        .bind(match_id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
