use super::cascade::replay_after;
use super::{ranks, Contestant, MatchError, Pass};
use crate::clock::Clock;
use crate::db::repo::matches;
use crate::db::Repository;
use crate::domain::{
    MatchId, MatchRecord, MatchStatus, NewMatch, Participants, PlayerId, Resolution, StatusUpdate,
};
use crate::engine::RatingPolicy;
use sqlx::SqliteConnection;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Transactional owner of match state and its rating effects.
///
/// Every operation that can move ratings takes the write gate before opening its transaction,
/// so two cascades never interleave.
#[derive(Debug)]
pub struct MatchEngine {
    repo: Arc<Repository>,
    policy: RatingPolicy,
    clock: Arc<dyn Clock>,
    write_gate: Mutex<()>,
}

async fn load_live<P: Contestant>(
    conn: &mut SqliteConnection,
    id: MatchId,
) -> Result<MatchRecord<P>, MatchError> {
    match matches::fetch_match::<P>(conn, id).await? {
        Some(record) if !record.is_deleted() => Ok(record),
        _ => Err(MatchError::match_not_found(id)),
    }
}

async fn require_roster<P: Contestant>(
    conn: &mut SqliteConnection,
    party: P,
) -> Result<Vec<PlayerId>, MatchError> {
    P::roster(conn, party)
        .await?
        .ok_or(MatchError::NotFound {
            entity: P::KIND.party_label(),
            id: party.raw(),
        })
}

impl MatchEngine {
    pub fn new(repo: Arc<Repository>, policy: RatingPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            policy,
            clock,
            write_gate: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> RatingPolicy {
        self.policy
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    /// Validate and record a reported result as pending. No rating effect.
    pub async fn create_match<P: Contestant>(
        &self,
        new: NewMatch<P>,
    ) -> Result<MatchRecord<P>, MatchError> {
        if new.side1 == new.side2 {
            return Err(MatchError::DuplicateParty(format!(
                "{} cannot play against itself",
                new.side1
            )));
        }
        if new.winner != new.side1 && new.winner != new.side2 {
            return Err(MatchError::InvalidWinner {
                winner: new.winner.to_string(),
            });
        }

        let mut tx = self.repo.begin().await?;
        let roster1 = require_roster(&mut tx, new.side1).await?;
        let roster2 = require_roster(&mut tx, new.side2).await?;
        if roster1.iter().any(|p| roster2.contains(p)) {
            return Err(MatchError::DuplicateParty(format!(
                "{} and {} share a player",
                new.side1, new.side2
            )));
        }

        let record = matches::insert_match(&mut tx, &new, self.clock.now()).await?;
        tx.commit().await?;

        info!(
            kind = %P::KIND,
            match_id = %record.id,
            side1 = %record.side1,
            side2 = %record.side2,
            "match reported"
        );
        Ok(record)
    }

    /// Load a match that has not been deleted.
    pub async fn get_match<P: Contestant>(&self, id: MatchId) -> Result<MatchRecord<P>, MatchError> {
        let mut conn = self.repo.pool().acquire().await?;
        load_live(&mut conn, id).await
    }

    /// Players on each side of a prospective match.
    pub async fn participants<P: Contestant>(
        &self,
        side1: P,
        side2: P,
    ) -> Result<Participants, MatchError> {
        let mut conn = self.repo.pool().acquire().await?;
        Ok(Participants {
            side1: require_roster(&mut conn, side1).await?,
            side2: require_roster(&mut conn, side2).await?,
        })
    }

    /// Players on each side of a live stored match.
    pub async fn match_participants<P: Contestant>(
        &self,
        id: MatchId,
    ) -> Result<Participants, MatchError> {
        let record = self.get_match::<P>(id).await?;
        self.participants(record.side1, record.side2).await
    }

    /// Resolve and/or correct the winner of a pending match.
    ///
    /// A confirmation stamps `confirmed_at`, applies the rating effects and re-ranks the ladder
    /// in the same transaction. A winner-only update leaves the match pending. An empty update
    /// returns the pending match unchanged.
    pub async fn update_status<P: Contestant>(
        &self,
        id: MatchId,
        update: StatusUpdate<P>,
    ) -> Result<MatchRecord<P>, MatchError> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.repo.begin().await?;

        let mut record = load_live::<P>(&mut tx, id).await?;
        if record.status != MatchStatus::Pending {
            return Err(MatchError::InvalidTransition {
                id,
                expected: MatchStatus::Pending,
                actual: record.status,
            });
        }
        if update.is_empty() {
            return Ok(record);
        }

        if let Some(winner) = update.winner {
            if !record.is_participant(winner) {
                return Err(MatchError::InvalidWinner {
                    winner: winner.to_string(),
                });
            }
            record.winner = winner;
        }
        if let Some(resolution) = update.status {
            record.status = resolution.into();
            if resolution == Resolution::Confirmed {
                record.confirmed_at = Some(self.clock.now());
                record.confirm_seq = Some(matches::next_confirm_seq(&mut tx, P::KIND).await?);
            }
        }

        matches::store_resolution(&mut tx, &record).await?;

        if record.status == MatchStatus::Confirmed {
            P::apply(&mut tx, &record, self.policy, Pass::Fresh).await?;
            let reranked = ranks::recalculate(&mut tx, P::LADDER).await?;
            debug!(match_id = %id, reranked, "applied confirmation");
        }

        tx.commit().await?;
        info!(
            kind = %P::KIND,
            match_id = %id,
            status = %record.status,
            winner = %record.winner,
            "match updated"
        );
        Ok(record)
    }

    pub async fn confirm<P: Contestant>(&self, id: MatchId) -> Result<MatchRecord<P>, MatchError> {
        self.update_status(id, StatusUpdate::resolve(Resolution::Confirmed))
            .await
    }

    pub async fn reject<P: Contestant>(&self, id: MatchId) -> Result<MatchRecord<P>, MatchError> {
        self.update_status(id, StatusUpdate::resolve(Resolution::Rejected))
            .await
    }

    pub async fn cancel<P: Contestant>(&self, id: MatchId) -> Result<MatchRecord<P>, MatchError> {
        self.update_status(id, StatusUpdate::resolve(Resolution::Cancelled))
            .await
    }

    /// Soft-delete a match. A confirmed match is retracted and every later confirmed match on
    /// the same ladder is replayed before the tombstone is written.
    pub async fn delete<P: Contestant>(&self, id: MatchId) -> Result<MatchRecord<P>, MatchError> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.repo.begin().await?;

        let mut record = load_live::<P>(&mut tx, id).await?;
        let was_confirmed = record.status == MatchStatus::Confirmed;

        if was_confirmed {
            let anchor = record.confirm_seq.ok_or_else(|| {
                MatchError::Inconsistent(format!(
                    "{} is confirmed without a confirmation sequence",
                    id
                ))
            })?;
            let started = Instant::now();
            P::retract(&mut tx, &record).await?;
            let replayed = replay_after::<P>(&mut tx, anchor, self.policy).await?;
            info!(
                kind = %P::KIND,
                match_id = %id,
                replayed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "cascade recompute finished"
            );
        }

        let now = self.clock.now();
        matches::mark_deleted(&mut tx, P::KIND, id, now).await?;
        record.deleted_at = Some(now);

        if was_confirmed {
            P::settle_deleted(&mut tx, &record).await?;
            ranks::recalculate(&mut tx, P::LADDER).await?;
        }

        tx.commit().await?;
        info!(kind = %P::KIND, match_id = %id, was_confirmed, "match deleted");
        Ok(record)
    }
}
