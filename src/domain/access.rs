//! Capabilities over the match lifecycle.
//!
//! Identity arrives pre-validated from the gateway. The verdict is computed here from a closed
//! set of capabilities and handed to the caller; the lifecycle engine never consults roles.

use crate::domain::PlayerId;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" | "user" => Ok(Role::Player),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user: PlayerId,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Submit a new pending result.
    ReportMatch,
    /// Confirm, reject, or correct the winner of a pending result.
    ResolveMatch,
    CancelMatch,
    DeleteMatch,
    /// Trigger the auto-validation sweep by hand.
    RunSweep,
}

/// Players on each side of a match. A solo side has one player, a team side two.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Participants {
    pub side1: Vec<PlayerId>,
    pub side2: Vec<PlayerId>,
}

impl Participants {
    pub fn contains(&self, player: PlayerId) -> bool {
        self.side1.contains(&player) || self.side2.contains(&player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Granted,
    Denied(&'static str),
}

impl Verdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted)
    }
}

pub fn authorize(actor: &Actor, capability: Capability, participants: &Participants) -> Verdict {
    if actor.is_admin() {
        return Verdict::Granted;
    }

    match capability {
        Capability::ReportMatch if participants.contains(actor.user) => Verdict::Granted,
        Capability::ReportMatch => Verdict::Denied("only a participant or an admin can report"),
        Capability::ResolveMatch if participants.side2.contains(&actor.user) => Verdict::Granted,
        Capability::ResolveMatch => {
            Verdict::Denied("only the second side or an admin can confirm or reject")
        }
        Capability::CancelMatch => Verdict::Denied("only an admin can cancel matches"),
        Capability::DeleteMatch => Verdict::Denied("only an admin can delete matches"),
        Capability::RunSweep => Verdict::Denied("only an admin can run the sweep"),
    }
}
