use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::api::identity::{actor_from_headers, require};
use crate::api::AppState;
use crate::domain::{Capability, Participants};
use crate::error::AppError;
use crate::orchestration::SweepReport;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweeperStatus {
    pub pending: i64,
    pub expired: i64,
    pub expiry_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<SweeperStatus>, AppError> {
    let counts = state.sweeper.counts().await?;
    Ok(Json(SweeperStatus {
        pending: counts.pending,
        expired: counts.expired,
        expiry_secs: state.sweeper.expiry().as_secs(),
    }))
}

pub async fn run_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, AppError> {
    let actor = actor_from_headers(&headers)?;
    require(&actor, Capability::RunSweep, &Participants::default())?;

    let report = state.sweeper.run_now().await?;
    Ok(Json(report))
}
