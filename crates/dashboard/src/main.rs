use dashboard::{
    auth::PasswordHasher, config::AppConfig, create_router, database::Database,
    handlers::SeedSettings, run_server, seed::Seeder,
};
use seed_data::SeedDataset;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = AppConfig::from_env();

    let dataset = match &config.seed_data_path {
        Some(path) => {
            tracing::info!("Loading seed data from {}", path.display());
            SeedDataset::from_path(path)?
        }
        None => SeedDataset::placeholder()?,
    };
    let seeder = Seeder::new(dataset, PasswordHasher::new(config.hash_cost)?)
        .with_timeout(config.seed_timeout);

    if config.expose_seed_diagnostics {
        tracing::warn!("Seed failures will return error details and traces to callers");
    }

    let db = Database::connect(&config).await?;
    tracing::info!("Connected to database");

    let app = create_router(
        db,
        seeder,
        SeedSettings {
            expose_diagnostics: config.expose_seed_diagnostics,
        },
    );

    run_server(app, config.port).await
}
