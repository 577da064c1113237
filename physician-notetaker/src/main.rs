use physician_notetaker::{AppState, Config, NoteTaker, build_router, telemetry::init_tracing};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().unwrap_or_else(|e| {
        error!(error = %e, "invalid configuration");
        std::process::exit(1);
    });
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "configuration loaded"
    );

    let notetaker = NoteTaker::from_config(&config.llm)?;
    let app = build_router(AppState::new(notetaker, config.server.request_timeout));

    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    let addr = listener.local_addr()?;

    info!("Physician Notetaker starting on {}", addr);
    info!("Full analysis endpoint: POST http://{}/api", addr);
    info!("Quick analysis endpoint: POST http://{}/api/quick", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
