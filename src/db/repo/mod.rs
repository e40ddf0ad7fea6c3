//! Repository layer for database operations.
//!
//! Submodules hold connection-scoped functions so the lifecycle engine can compose them inside a
//! single transaction:
//! - `players.rs` - player aggregates, rating tracks, streaks and ranks
//! - `teams.rs` - team aggregates
//! - `matches.rs` - solo and team match rows
//! - `history.rs` - the rating ledger
//!
//! `Repository` wraps the pool and exposes the pool-level reads and directory writes.

pub mod history;
pub mod matches;
pub mod players;
pub mod teams;

use crate::domain::{
    Ladder, MatchId, MatchKind, MatchRecord, PartyId, PlayerAggregate, PlayerId,
    RatingHistoryEntry, TeamAggregate, TeamId, TimeMs,
};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a write transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Register a player with default ratings on both ladders.
    pub async fn create_player(
        &self,
        username: &str,
        at: TimeMs,
    ) -> Result<PlayerAggregate, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let player = players::insert_player(&mut tx, username, at).await?;
        tx.commit().await?;
        Ok(player)
    }

    /// Register a fixed pair. The schema rejects a pair that already exists in either order.
    pub async fn create_team(
        &self,
        player1: PlayerId,
        player2: PlayerId,
        name: Option<&str>,
        at: TimeMs,
    ) -> Result<TeamAggregate, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let team = teams::insert_team(&mut tx, player1, player2, name, at).await?;
        tx.commit().await?;
        Ok(team)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_player(&self, id: PlayerId) -> Result<Option<PlayerAggregate>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_player(&mut conn, id).await
    }

    pub async fn get_team(&self, id: TeamId) -> Result<Option<TeamAggregate>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        teams::fetch_team(&mut conn, id).await
    }

    pub async fn get_match<P: PartyId>(
        &self,
        id: MatchId,
    ) -> Result<Option<MatchRecord<P>>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(&mut conn, id).await
    }

    /// Players in rank order on one ladder.
    pub async fn leaderboard(&self, ladder: Ladder) -> Result<Vec<PlayerAggregate>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        players::list_by_rank(&mut conn, ladder).await
    }

    pub async fn player_history(
        &self,
        player: PlayerId,
        kind: Option<MatchKind>,
    ) -> Result<Vec<RatingHistoryEntry>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        history::entries_for_player(&mut conn, player, kind).await
    }

    pub async fn match_history(
        &self,
        kind: MatchKind,
        match_id: MatchId,
    ) -> Result<Vec<RatingHistoryEntry>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        history::entries_for_match(&mut conn, kind, match_id).await
    }

    /// Live pending matches of one ladder, optionally only those created before `cutoff`.
    pub async fn count_pending(
        &self,
        kind: MatchKind,
        cutoff: Option<TimeMs>,
    ) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::count_pending(&mut conn, kind, cutoff).await
    }

    pub async fn expired_pending(
        &self,
        kind: MatchKind,
        cutoff: TimeMs,
    ) -> Result<Vec<MatchId>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::expired_pending(&mut conn, kind, cutoff).await
    }
}
