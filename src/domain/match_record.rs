//! Reported match results and their lifecycle status.

use crate::domain::{MatchId, PartyId, PlayerId, TeamId, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a reported match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "confirmed" => Ok(MatchStatus::Confirmed),
            "rejected" => Ok(MatchStatus::Rejected),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(format!("unknown match status: {}", other)),
        }
    }
}

/// Terminal status a pending match can be resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Confirmed,
    Rejected,
    Cancelled,
}

impl From<Resolution> for MatchStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Confirmed => MatchStatus::Confirmed,
            Resolution::Rejected => MatchStatus::Rejected,
            Resolution::Cancelled => MatchStatus::Cancelled,
        }
    }
}

/// A reported result between two parties of the same ladder.
///
/// `P` is [`PlayerId`] for solo matches and [`TeamId`] for team matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord<P: PartyId> {
    pub id: MatchId,
    pub side1: P,
    pub side2: P,
    pub winner: P,
    pub status: MatchStatus,
    pub created_at: TimeMs,
    pub confirmed_at: Option<TimeMs>,
    /// Position in the ladder's confirmation order, assigned when the match is confirmed.
    /// Replays follow this order; several matches may share a `confirmed_at`.
    #[serde(skip)]
    pub confirm_seq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<TimeMs>,
}

pub type SoloMatch = MatchRecord<PlayerId>;
pub type TeamMatch = MatchRecord<TeamId>;

impl<P: PartyId> MatchRecord<P> {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_participant(&self, party: P) -> bool {
        party == self.side1 || party == self.side2
    }

    /// The side that did not win.
    pub fn loser(&self) -> P {
        if self.winner == self.side1 {
            self.side2
        } else {
            self.side1
        }
    }

    pub fn side1_won(&self) -> bool {
        self.winner == self.side1
    }
}

/// A result as reported, before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch<P: PartyId> {
    pub side1: P,
    pub side2: P,
    pub winner: P,
}

/// Requested change to a pending match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate<P: PartyId> {
    pub status: Option<Resolution>,
    pub winner: Option<P>,
}

impl<P: PartyId> StatusUpdate<P> {
    pub fn resolve(resolution: Resolution) -> Self {
        Self {
            status: Some(resolution),
            winner: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.winner.is_none()
    }
}
