//! Identity forwarded by the upstream gateway, and capability checks against it.

use crate::domain::{authorize, Actor, Capability, Participants, PlayerId, Role, Verdict};
use crate::error::AppError;
use axum::http::HeaderMap;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Read the already-validated caller identity. A missing role means a plain player.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("{} header is required", USER_ID_HEADER)))?;

    let role = match headers.get(USER_ROLE_HEADER) {
        None => Role::Player,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("invalid {}", USER_ROLE_HEADER)))?,
    };

    Ok(Actor {
        user: PlayerId::new(user),
        role,
    })
}

pub fn require(
    actor: &Actor,
    capability: Capability,
    participants: &Participants,
) -> Result<(), AppError> {
    match authorize(actor, capability, participants) {
        Verdict::Granted => Ok(()),
        Verdict::Denied(reason) => {
            tracing::debug!(user = %actor.user, ?capability, reason, "request denied");
            Err(AppError::Forbidden(reason.to_string()))
        }
    }
}
