use recruitair::{
    config::{DatabaseConfig, RemoteApiConfig, WorkerConfig},
    db::{self, batch::PgStorage},
    pipeline::{dispatch::error_chain, extractor::Extractor, scheduler},
    services::remote::RemoteApiClient,
    telemetry,
};

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    tracing::info!("Starting criteria extractor worker");

    let config = WorkerConfig::from_env().expect("Failed to load worker configuration");
    let db_config = DatabaseConfig::from_env().expect("Failed to load database configuration");
    let remote_config =
        RemoteApiConfig::extractor_from_env().expect("Failed to load extractor API configuration");

    telemetry::install_worker_exporter(&config).expect("Failed to start metrics exporter");
    telemetry::describe_worker_metrics();

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(db_config.connect_options())
        .await
        .expect("Failed to connect to database");

    let client = RemoteApiClient::new(&remote_config, config.timeout())
        .expect("Failed to initialize extractor API client");

    let extractor = Extractor::new(PgStorage::new(db_pool), client);

    if let Err(e) = scheduler::run(&extractor, &config).await {
        tracing::error!(error = %error_chain(&e), "Extractor stopped on storage failure");
        std::process::exit(1);
    }
}
