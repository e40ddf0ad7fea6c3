use elo_ladder::orchestration::ShutdownSignal;
use elo_ladder::{
    api, config::Config, db::init_db, AutoValidationSweeper, Clock, MatchEngine, Repository,
    Scheduler, SystemClock,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Arc::new(MatchEngine::new(
        repo.clone(),
        config.rating_policy,
        clock.clone(),
    ));
    let sweeper = Arc::new(AutoValidationSweeper::new(
        repo.clone(),
        engine.clone(),
        clock,
        config.pending_expiry,
    ));

    let (shutdown, shutdown_rx) = ShutdownSignal::new();
    let scheduler = Scheduler::new(sweeper.clone(), config.sweep_interval).spawn(shutdown_rx);

    let port = config.port;
    let app = api::create_router(api::AppState::new(repo, config, engine, sweeper));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "could not listen for ctrl-c");
            }
        })
        .await;

    shutdown.shutdown();
    if let Err(e) = scheduler.await {
        tracing::warn!(error = %e, "sweep scheduler task ended abnormally");
    }

    if let Err(e) = served {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
