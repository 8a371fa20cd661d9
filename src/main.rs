use marketplace::{build_router, image::uploader_from_config, AppConfig, AppState};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Optional .env file
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    info!(bind_addr = %config.bind_addr, "Starting marketplace server");

    let session_ttl = chrono::Duration::days(config.session_ttl_days);
    let image_uploader = uploader_from_config(&config);

    let app_state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Connected to PostgreSQL and applied migrations");
            AppState::postgres(pool, session_ttl, image_uploader)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage");
            AppState::in_memory(session_ttl, image_uploader)
        }
    };

    let app = build_router(app_state, &config.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
