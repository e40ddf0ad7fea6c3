//! Rank recalculation for one ladder.

use crate::db::repo::players;
use crate::domain::Ladder;
use crate::engine::competition_ranks;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::debug;

/// Re-rank every player on `ladder` and write only the ranks that changed.
///
/// Returns the number of rows written.
pub async fn recalculate(conn: &mut SqliteConnection, ladder: Ladder) -> Result<usize, sqlx::Error> {
    let population = players::rank_population(conn, ladder).await?;
    let stored: HashMap<i64, i64> = population.iter().map(|row| (row.id, row.rank)).collect();
    let ratings: Vec<(i64, f64)> = population.iter().map(|row| (row.id, row.rating)).collect();

    let mut written = 0usize;
    for (id, rank) in competition_ranks(&ratings) {
        if stored.get(&id) != Some(&rank) {
            players::set_rank(conn, id, ladder, rank).await?;
            written += 1;
        }
    }

    debug!(ladder = ?ladder, players = population.len(), written, "ranks recalculated");
    Ok(written)
}
