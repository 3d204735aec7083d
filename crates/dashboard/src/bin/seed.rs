//! Seeds the dashboard database without going through HTTP.
//!
//! Run with:
//! ```
//! cargo run -p dashboard --bin seed
//! ```
//!
//! `SEED_DRY_RUN=1` seeds an in-memory store instead and prints what would be
//! written. `SEED_SYNTHETIC_CUSTOMERS` / `SEED_SYNTHETIC_INVOICES` grow the
//! fixture with generated rows (reproducible, seeded rng).

use dashboard::{
    auth::PasswordHasher,
    config::AppConfig,
    database::Database,
    seed::{MemoryStore, SeedReport, Seeder, Table},
};
use rand::{SeedableRng, rngs::StdRng};
use seed_data::{SeedDataset, generators::extend_with_synthetic};
use tracing_subscriber::EnvFilter;

const SYNTHETIC_RNG_SEED: u64 = 12345;

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_count(name: &str) -> anyhow::Result<usize> {
    match std::env::var(name) {
        Ok(raw) => Ok(raw.parse()?),
        Err(_) => Ok(0),
    }
}

fn log_report(report: &SeedReport) {
    tracing::info!("Seed completed!");
    tracing::info!("  Users: {}/{}", report.users.inserted, report.users.attempted);
    tracing::info!("  Customers: {}/{}", report.customers.inserted, report.customers.attempted);
    tracing::info!("  Invoices: {}/{}", report.invoices.inserted, report.invoices.attempted);
    tracing::info!("  Revenue: {}/{}", report.revenue.inserted, report.revenue.attempted);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let mut dataset = match &config.seed_data_path {
        Some(path) => SeedDataset::from_path(path)?,
        None => SeedDataset::placeholder()?,
    };

    let synthetic_customers = env_count("SEED_SYNTHETIC_CUSTOMERS")?;
    let synthetic_invoices = env_count("SEED_SYNTHETIC_INVOICES")?;
    if synthetic_customers > 0 || synthetic_invoices > 0 {
        let mut rng = StdRng::seed_from_u64(SYNTHETIC_RNG_SEED);
        extend_with_synthetic(&mut dataset, synthetic_customers, synthetic_invoices, &mut rng)?;
    }
    tracing::info!("Dataset ready: {} rows", dataset.row_count());

    let seeder = Seeder::new(dataset, PasswordHasher::new(config.hash_cost)?)
        .with_timeout(config.seed_timeout);

    if env_flag("SEED_DRY_RUN") {
        let store = MemoryStore::new();
        let report = seeder.run(&store).await?;
        log_report(&report);
        tracing::info!("Dry run, {} statements issued:", store.journal().len());
        for table in Table::ALL {
            tracing::info!("  {}: {} rows", table, store.row_count(table));
        }
        return Ok(());
    }

    let db = Database::connect(&config).await?;
    tracing::info!("Connected to database");

    let report = seeder.run(&db).await?;
    log_report(&report);

    Ok(())
}
