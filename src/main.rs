use vantage_api::database::manager::DatabaseManager;
use vantage_api::{app, config};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Vantage API in {:?} mode", config.environment);

    // Opt-in migration on boot for dev and container deployments
    if std::env::var("RUN_MIGRATIONS").map(|v| v == "true").unwrap_or(false) {
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::error!("Migration failed: {}", e);
            std::process::exit(1);
        }
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("VANTAGE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Vantage API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
