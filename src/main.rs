use recruitair::{
    app_state::AppState,
    config::{DatabaseConfig, ServerConfig},
    db, routes, telemetry,
};

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    // Load configuration from environment
    let server_config = ServerConfig::from_env().expect("Failed to load server configuration");
    let db_config = DatabaseConfig::from_env().expect("Failed to load database configuration");

    tracing::info!("Initializing recruitair API server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = telemetry::prometheus_builder()
        .and_then(|builder| builder.install_recorder())
        .expect("Failed to install Prometheus metrics recorder");
    telemetry::describe_api_metrics();

    // Initialize database connection pool
    tracing::info!(host = %db_config.host, database = %db_config.database, "Connecting to PostgreSQL");
    let db_pool = db::init_pool(db_config.connect_options())
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let app = routes::router(AppState::new(db_pool, prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", server_config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
