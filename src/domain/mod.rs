//! Domain types for the rating ladder.
//!
//! This module provides:
//! - Identifiers and time primitives: PlayerId, TeamId, MatchId, TimeMs
//! - Match records and their lifecycle status
//! - Rating aggregates with one `RatingTrack` per ladder
//! - Rating ledger entries
//! - The closed capability set used to gate lifecycle requests

pub mod access;
pub mod aggregate;
pub mod history;
pub mod match_record;
pub mod primitives;

pub use access::{authorize, Actor, Capability, Participants, Role, Verdict};
pub use aggregate::{Ladder, PlayerAggregate, RatingTrack, TeamAggregate, INITIAL_RATING};
pub use history::{Opponent, RatingHistoryEntry};
pub use match_record::{
    MatchRecord, MatchStatus, NewMatch, Resolution, SoloMatch, StatusUpdate, TeamMatch,
};
pub use primitives::{MatchId, MatchKind, PartyId, PlayerId, TeamId, TimeMs};
