//! Match lifecycle endpoints. One generic handler set serves both ladders.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::identity::{actor_from_headers, require};
use crate::api::AppState;
use crate::domain::{Capability, MatchId, MatchRecord, NewMatch, Resolution, StatusUpdate};
use crate::error::AppError;
use crate::lifecycle::Contestant;

pub async fn create_match<P>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewMatch<P>>,
) -> Result<(StatusCode, Json<MatchRecord<P>>), AppError>
where
    P: Contestant + DeserializeOwned,
{
    let actor = actor_from_headers(&headers)?;
    let participants = state.engine.participants(body.side1, body.side2).await?;
    require(&actor, Capability::ReportMatch, &participants)?;

    let record = state.engine.create_match(body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_match<P>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StatusUpdate<P>>,
) -> Result<Json<MatchRecord<P>>, AppError>
where
    P: Contestant + DeserializeOwned,
{
    let actor = actor_from_headers(&headers)?;
    if body.is_empty() {
        return Err(AppError::BadRequest(
            "status or winner must be provided".to_string(),
        ));
    }

    let id = MatchId::new(id);
    let capability = match body.status {
        Some(Resolution::Cancelled) => Capability::CancelMatch,
        _ => Capability::ResolveMatch,
    };
    let participants = state.engine.match_participants::<P>(id).await?;
    require(&actor, capability, &participants)?;

    let record = state.engine.update_status(id, body).await?;
    Ok(Json(record))
}

pub async fn delete_match<P>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<MatchRecord<P>>, AppError>
where
    P: Contestant + DeserializeOwned,
{
    let actor = actor_from_headers(&headers)?;
    let id = MatchId::new(id);
    let participants = state.engine.match_participants::<P>(id).await?;
    require(&actor, Capability::DeleteMatch, &participants)?;

    let record = state.engine.delete::<P>(id).await?;
    Ok(Json(record))
}
