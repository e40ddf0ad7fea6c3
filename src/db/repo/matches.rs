//! Solo and team match rows.
//!
//! Both ladders share one row shape; the table is picked from the party type's
//! [`MatchKind`](crate::domain::MatchKind).

use crate::domain::{
    MatchId, MatchKind, MatchRecord, MatchStatus, NewMatch, PartyId, PlayerId, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const MATCH_COLUMNS: &str =
    "id, side1_id, side2_id, winner_id, status, created_at, confirmed_at, confirm_seq, deleted_at";

fn table(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Solo => "solo_matches",
        MatchKind::Team => "team_matches",
    }
}

fn match_from_row<P: PartyId>(row: &SqliteRow) -> Result<MatchRecord<P>, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<MatchStatus>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: e.into(),
        })?;

    Ok(MatchRecord {
        id: MatchId::new(row.try_get("id")?),
        side1: P::from_i64(row.try_get("side1_id")?),
        side2: P::from_i64(row.try_get("side2_id")?),
        winner: P::from_i64(row.try_get("winner_id")?),
        status,
        created_at: TimeMs::new(row.try_get("created_at")?),
        confirmed_at: row
            .try_get::<Option<i64>, _>("confirmed_at")?
            .map(TimeMs::new),
        confirm_seq: row.try_get("confirm_seq")?,
        deleted_at: row.try_get::<Option<i64>, _>("deleted_at")?.map(TimeMs::new),
    })
}

pub async fn insert_match<P: PartyId>(
    conn: &mut SqliteConnection,
    new: &NewMatch<P>,
    created_at: TimeMs,
) -> Result<MatchRecord<P>, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (side1_id, side2_id, winner_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
        table(P::KIND)
    );
    let result = sqlx::query(&sql)
        .bind(new.side1.raw())
        .bind(new.side2.raw())
        .bind(new.winner.raw())
        .bind(MatchStatus::Pending.as_str())
        .bind(created_at.as_i64())
        .execute(&mut *conn)
        .await?;

    Ok(MatchRecord {
        id: MatchId::new(result.last_insert_rowid()),
        side1: new.side1,
        side2: new.side2,
        winner: new.winner,
        status: MatchStatus::Pending,
        created_at,
        confirmed_at: None,
        confirm_seq: None,
        deleted_at: None,
    })
}

/// Load a match, tombstoned or not.
pub async fn fetch_match<P: PartyId>(
    conn: &mut SqliteConnection,
    id: MatchId,
) -> Result<Option<MatchRecord<P>>, sqlx::Error> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", MATCH_COLUMNS, table(P::KIND));
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(match_from_row::<P>).transpose()
}

/// Persist the mutable fields of a pending match being resolved.
pub async fn store_resolution<P: PartyId>(
    conn: &mut SqliteConnection,
    record: &MatchRecord<P>,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET status = ?, winner_id = ?, confirmed_at = ?, confirm_seq = ? \
         WHERE id = ? AND status = 'pending' AND deleted_at IS NULL",
        table(P::KIND)
    );
    let result = sqlx::query(&sql)
        .bind(record.status.as_str())
        .bind(record.winner.raw())
        .bind(record.confirmed_at.map(|t| t.as_i64()))
        .bind(record.confirm_seq)
        .bind(record.id.as_i64())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn mark_deleted(
    conn: &mut SqliteConnection,
    kind: MatchKind,
    id: MatchId,
    deleted_at: TimeMs,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
        table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(deleted_at.as_i64())
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Next free slot in the confirmation order of one ladder.
///
/// Must run in the transaction that stores the confirmation, under the engine's write gate.
/// Sequence numbers of deleted matches are never reused.
pub async fn next_confirm_seq(
    conn: &mut SqliteConnection,
    kind: MatchKind,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COALESCE(MAX(confirm_seq), 0) + 1 AS next FROM {}",
        table(kind)
    );
    let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
    row.try_get("next")
}

/// Live confirmed matches confirmed after sequence `after`, in confirmation order.
///
/// Confirmed rows missing a sequence number are returned too (first), so callers can refuse
/// to replay over them.
pub async fn confirmed_after<P: PartyId>(
    conn: &mut SqliteConnection,
    after: i64,
) -> Result<Vec<MatchRecord<P>>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM {}
        WHERE status = 'confirmed'
          AND deleted_at IS NULL
          AND (confirm_seq IS NULL OR confirm_seq > ?)
        ORDER BY confirm_seq ASC
        "#,
        MATCH_COLUMNS,
        table(P::KIND)
    );
    let rows = sqlx::query(&sql)
        .bind(after)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(match_from_row::<P>).collect()
}

/// Ids of live pending matches created strictly before `cutoff`, in discovery order.
pub async fn expired_pending(
    conn: &mut SqliteConnection,
    kind: MatchKind,
    cutoff: TimeMs,
) -> Result<Vec<MatchId>, sqlx::Error> {
    let sql = format!(
        "SELECT id FROM {} WHERE status = 'pending' AND deleted_at IS NULL AND created_at < ? \
         ORDER BY created_at ASC, id ASC",
        table(kind)
    );
    let rows = sqlx::query(&sql)
        .bind(cutoff.as_i64())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("id").map(MatchId::new))
        .collect()
}

/// Live pending matches, optionally only those created before `cutoff`.
pub async fn count_pending(
    conn: &mut SqliteConnection,
    kind: MatchKind,
    cutoff: Option<TimeMs>,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) AS n FROM {} WHERE status = 'pending' AND deleted_at IS NULL \
         AND (? IS NULL OR created_at < ?)",
        table(kind)
    );
    let cutoff = cutoff.map(|t| t.as_i64());
    let row = sqlx::query(&sql)
        .bind(cutoff)
        .bind(cutoff)
        .fetch_one(&mut *conn)
        .await?;
    row.try_get("n")
}

/// Win/loss sequence of a player's live confirmed solo matches, oldest first.
pub async fn solo_results_for(
    conn: &mut SqliteConnection,
    player: PlayerId,
) -> Result<Vec<bool>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT winner_id = ? AS won
        FROM solo_matches
        WHERE status = 'confirmed'
          AND deleted_at IS NULL
          AND (side1_id = ? OR side2_id = ?)
        ORDER BY confirm_seq ASC
        "#,
    )
    .bind(player.as_i64())
    .bind(player.as_i64())
    .bind(player.as_i64())
    .fetch_all(&mut *conn)
    .await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("won").map(|won| won != 0))
        .collect()
}
