pub mod health;
pub mod identity;
pub mod matches;
pub mod sweeper;

use crate::config::Config;
use crate::db::Repository;
use crate::domain::{PlayerId, TeamId};
use crate::lifecycle::MatchEngine;
use crate::orchestration::AutoValidationSweeper;
use axum::http::HeaderValue;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub engine: Arc<MatchEngine>,
    pub sweeper: Arc<AutoValidationSweeper>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        engine: Arc<MatchEngine>,
        sweeper: Arc<AutoValidationSweeper>,
    ) -> Self {
        Self {
            repo,
            config,
            engine,
            sweeper,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match &config.cors_allowed_origins {
        None => AllowOrigin::any(),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!(origin = %o, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/matches", post(matches::create_match::<PlayerId>))
        .route(
            "/v1/matches/:id",
            patch(matches::update_match::<PlayerId>).delete(matches::delete_match::<PlayerId>),
        )
        .route("/v1/team-matches", post(matches::create_match::<TeamId>))
        .route(
            "/v1/team-matches/:id",
            patch(matches::update_match::<TeamId>).delete(matches::delete_match::<TeamId>),
        )
        .route("/v1/sweeper", get(sweeper::get_status))
        .route("/v1/sweeper/run", post(sweeper::run_sweep))
        .layer(cors)
        .with_state(state)
}
