//! Auto-confirmation of pending matches nobody resolved in time.

use crate::clock::Clock;
use crate::db::Repository;
use crate::domain::{MatchId, MatchKind, PlayerId, TeamId, TimeMs};
use crate::lifecycle::{MatchEngine, MatchError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pending matches older than this are confirmed by the sweep.
pub const DEFAULT_PENDING_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Confirmation path the sweeper feeds expired matches into.
#[async_trait]
pub trait MatchConfirmer: Send + Sync + fmt::Debug {
    async fn confirm_pending(&self, kind: MatchKind, id: MatchId) -> Result<(), MatchError>;
}

#[async_trait]
impl MatchConfirmer for MatchEngine {
    async fn confirm_pending(&self, kind: MatchKind, id: MatchId) -> Result<(), MatchError> {
        match kind {
            MatchKind::Solo => self.confirm::<PlayerId>(id).await.map(|_| ()),
            MatchKind::Team => self.confirm::<TeamId>(id).await.map(|_| ()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub solo_confirmed: usize,
    pub team_confirmed: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn confirmed(&self) -> usize {
        self.solo_confirmed + self.team_confirmed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCounts {
    pub pending: i64,
    pub expired: i64,
}

#[derive(Debug)]
pub struct AutoValidationSweeper {
    repo: Arc<Repository>,
    confirmer: Arc<dyn MatchConfirmer>,
    clock: Arc<dyn Clock>,
    expiry: Duration,
}

impl AutoValidationSweeper {
    pub fn new(
        repo: Arc<Repository>,
        confirmer: Arc<dyn MatchConfirmer>,
        clock: Arc<dyn Clock>,
        expiry: Duration,
    ) -> Self {
        Self {
            repo,
            confirmer,
            clock,
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Matches created strictly before this instant are expired at `now`.
    pub fn cutoff(&self, now: TimeMs) -> TimeMs {
        let expiry_ms = i64::try_from(self.expiry.as_millis()).unwrap_or(i64::MAX);
        now.minus_ms(expiry_ms)
    }

    /// Confirm every match that is expired now, solo ladder first.
    ///
    /// A match that fails to confirm is logged and counted, and the batch moves on.
    pub async fn run_now(&self) -> Result<SweepReport, sqlx::Error> {
        self.run_at(self.clock.now()).await
    }

    /// `now` only selects which matches are expired. The engine stamps `confirmed_at` from its
    /// own clock, which is the same clock in every wiring of this sweeper.
    async fn run_at(&self, now: TimeMs) -> Result<SweepReport, sqlx::Error> {
        let cutoff = self.cutoff(now);
        let mut report = SweepReport::default();

        for kind in [MatchKind::Solo, MatchKind::Team] {
            let expired = self.repo.expired_pending(kind, cutoff).await?;
            for id in expired {
                match self.confirmer.confirm_pending(kind, id).await {
                    Ok(()) => match kind {
                        MatchKind::Solo => report.solo_confirmed += 1,
                        MatchKind::Team => report.team_confirmed += 1,
                    },
                    Err(e) => {
                        warn!(kind = %kind, match_id = %id, error = %e, "auto-confirmation failed");
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            solo_confirmed = report.solo_confirmed,
            team_confirmed = report.team_confirmed,
            failed = report.failed,
            cutoff = %cutoff,
            "sweep finished"
        );
        Ok(report)
    }

    /// Live pending matches across both ladders.
    pub async fn pending_count(&self) -> Result<i64, sqlx::Error> {
        self.count(None).await
    }

    /// Live pending matches the next sweep would confirm.
    pub async fn expired_count(&self) -> Result<i64, sqlx::Error> {
        self.count(Some(self.cutoff(self.clock.now()))).await
    }

    pub async fn counts(&self) -> Result<PendingCounts, sqlx::Error> {
        Ok(PendingCounts {
            pending: self.pending_count().await?,
            expired: self.expired_count().await?,
        })
    }

    async fn count(&self, cutoff: Option<TimeMs>) -> Result<i64, sqlx::Error> {
        let solo = self.repo.count_pending(MatchKind::Solo, cutoff).await?;
        let team = self.repo.count_pending(MatchKind::Team, cutoff).await?;
        Ok(solo + team)
    }
}
