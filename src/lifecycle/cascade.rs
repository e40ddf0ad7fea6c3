//! Replay of confirmed matches that follow a retracted one on the same ladder.

use super::{Contestant, MatchError, Pass};
use crate::db::repo::{history, matches};
use crate::domain::{MatchRecord, PartyId};
use crate::engine::RatingPolicy;
use sqlx::SqliteConnection;

/// Every replayed match needs its slot in the confirmation order.
fn ensure_sequenced<P: PartyId>(later: &[MatchRecord<P>]) -> Result<(), MatchError> {
    match later.iter().find(|m| m.confirm_seq.is_none()) {
        Some(m) => Err(MatchError::Inconsistent(format!(
            "{} is confirmed without a confirmation sequence",
            m.id
        ))),
        None => Ok(()),
    }
}

/// Recompute every live confirmed match of ladder `P` confirmed after sequence `anchor`.
///
/// Callers must already have retracted the anchor match. All later deltas are rewound first so
/// the aggregates sit at the corrected state just before the first later match, then each match
/// is re-scored in confirmation order and its ledger rows rewritten with the original
/// confirmation time. Returns the number of matches replayed.
pub(crate) async fn replay_after<P: Contestant>(
    conn: &mut SqliteConnection,
    anchor: i64,
    policy: RatingPolicy,
) -> Result<usize, MatchError> {
    let later = matches::confirmed_after::<P>(conn, anchor).await?;
    ensure_sequenced(&later)?;

    for record in later.iter().rev() {
        P::rewind(conn, record).await?;
    }

    for record in &later {
        history::delete_for_match(conn, P::KIND, record.id).await?;
        P::apply(conn, record, policy, Pass::Replay).await?;
    }

    Ok(later.len())
}
