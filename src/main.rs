use tokio::net::TcpListener;
use tracing::info;
use wanderlust::config::AppConfig;
use wanderlust::error::AppError;
use wanderlust::routes::create_router;
use wanderlust::services::travel::TravelState;
use wanderlust::state::{open_storage, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let storage = open_storage(&config).await?;

    if config.seed_sample_data {
        storage.seed_sample_data().await?;
    }

    let mut state = AppState::new(config.clone(), storage.clone());
    state.planner = TravelState::load(&storage).await?;

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,wanderlust=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
