//! Domain primitives: TimeMs, identifiers, MatchKind.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// This instant moved back by `ms` milliseconds, saturating at `i64::MIN`.
    pub fn minus_ms(&self, ms: i64) -> Self {
        TimeMs(self.0.saturating_sub(ms))
    }

    /// This instant moved forward by `ms` milliseconds, saturating at `i64::MAX`.
    pub fn plus_ms(&self, ms: i64) -> Self {
        TimeMs(self.0.saturating_add(ms))
    }
}

impl fmt::Display for TimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                $name(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }
    };
}

id_type!(
    /// Player identity (shared with the user account id).
    PlayerId,
    "player"
);
id_type!(
    /// Fixed two-player team identity.
    TeamId,
    "team"
);
id_type!(
    /// Match identity. Solo and team matches have independent id spaces.
    MatchId,
    "match"
);

/// Which ladder a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// One player against one player.
    Solo,
    /// One fixed pair against another.
    Team,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Solo => "solo",
            MatchKind::Team => "team",
        }
    }

    /// Name of the competing party on this ladder.
    pub fn party_label(&self) -> &'static str {
        match self {
            MatchKind::Solo => "player",
            MatchKind::Team => "team",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(MatchKind::Solo),
            "team" => Ok(MatchKind::Team),
            other => Err(format!("unknown match kind: {}", other)),
        }
    }
}

/// A competing side of a match: a player on the solo ladder, a team on the team ladder.
pub trait PartyId:
    Copy + Eq + Ord + fmt::Debug + fmt::Display + Send + Sync + Serialize + 'static
{
    /// Ladder this party competes on.
    const KIND: MatchKind;

    fn from_i64(id: i64) -> Self;

    fn raw(&self) -> i64;
}

impl PartyId for PlayerId {
    const KIND: MatchKind = MatchKind::Solo;

    fn from_i64(id: i64) -> Self {
        PlayerId(id)
    }

    fn raw(&self) -> i64 {
        self.0
    }
}

impl PartyId for TeamId {
    const KIND: MatchKind = MatchKind::Team;

    fn from_i64(id: i64) -> Self {
        TeamId(id)
    }

    fn raw(&self) -> i64 {
        self.0
    }
}
