//! Integration tests for seeding against PostgreSQL.
//!
//! To run these tests, you need a PostgreSQL database (with the `uuid-ossp`
//! extension available) and DATABASE_URL set:
//!
//! `DATABASE_URL=postgres://... cargo nextest run -p dashboard seed_integration`
//!
//! Each test works in its own throwaway schema, so they can safely run
//! against a development database. `uuid-ossp` is installed into `public`
//! up front and shared by every schema.

use std::{env, str::FromStr};

use dashboard::{
    auth::{PasswordHasher, verify_password},
    cards::CardDataSource,
    config::HashCost,
    database::Database,
    seed::{SeedError, Seeder},
};
use seed_data::{RevenueRecord, SeedDataset};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use uuid::Uuid;

/// Get a pool scoped to a fresh schema, skipping tests if DATABASE_URL is not set.
async fn get_test_pool(schema: &str) -> Option<PgPool> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let admin = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };
    install_uuid_extension(&admin)
        .await
        .expect("Failed to install uuid-ossp");
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let options = PgConnectOptions::from_str(&database_url)
        .expect("Invalid DATABASE_URL")
        .options([("search_path", format!("{schema},public"))]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("Failed to connect with test schema");

    Some(pool)
}

/// Installs `uuid-ossp` into `public` once for the whole database.
///
/// Extensions are database-wide: left to the seeder, the first test would
/// install it into its own throwaway schema where the others cannot see it.
/// The advisory lock keeps parallel tests from racing on the install.
async fn install_uuid_extension(admin: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = admin.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('seed_test_uuid_ossp'))")
        .execute(&mut *tx)
        .await?;
    sqlx::query(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp" SCHEMA public"#)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

async fn cleanup_schema(pool: &PgPool, schema: &str) {
    let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(pool)
        .await;
}

fn test_schema() -> String {
    format!("seed_test_{}", Uuid::new_v4().simple())
}

fn seeder(dataset: SeedDataset) -> Seeder {
    let hasher = PasswordHasher::new(HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    Seeder::new(dataset, hasher)
}

async fn table_exists(pool: &PgPool, schema: &str, table: &str) -> bool {
    let regclass: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
        .bind(format!("{schema}.{table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    regclass.is_some()
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let schema = test_schema();
    let Some(pool) = get_test_pool(&schema).await else {
        return;
    };
    let db = Database::new(pool.clone());
    let seeder = seeder(SeedDataset::placeholder().unwrap());

    let first = seeder.run(&db).await.expect("First seed failed");
    let second = seeder.run(&db).await.expect("Second seed failed");

    assert_eq!(first.total_inserted(), 32);
    assert_eq!(second.total_inserted(), 0);

    let revenue_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revenue")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(revenue_rows, 12);

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_seeded_password_verifies() {
    let schema = test_schema();
    let Some(pool) = get_test_pool(&schema).await else {
        return;
    };
    let db = Database::new(pool.clone());
    seeder(SeedDataset::placeholder().unwrap())
        .run(&db)
        .await
        .expect("Seed failed");

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE email = $1")
        .bind("user@nextmail.com")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_ne!(stored, "123456");
    assert!(verify_password("123456", &stored).unwrap());

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_card_data_after_seed() {
    let schema = test_schema();
    let Some(pool) = get_test_pool(&schema).await else {
        return;
    };
    let db = Database::new(pool.clone());
    seeder(SeedDataset::placeholder().unwrap())
        .run(&db)
        .await
        .expect("Seed failed");

    let data = db.fetch_card_data().await.expect("Aggregation failed");

    assert_eq!(data.total_paid_invoices, 100626);
    assert_eq!(data.total_pending_invoices, 125632);
    assert_eq!(data.number_of_invoices, 13);
    assert_eq!(data.number_of_customers, 6);

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_failed_revenue_rolls_back_everything() {
    let schema = test_schema();
    let Some(pool) = get_test_pool(&schema).await else {
        return;
    };
    let db = Database::new(pool.clone());

    let mut dataset = SeedDataset::placeholder().unwrap();
    // Longer than VARCHAR(4), rejected by the store
    dataset.revenue.insert(
        2,
        RevenueRecord {
            month: "March".to_string(),
            revenue: 1,
        },
    );

    let result = seeder(dataset).run(&db).await;

    assert!(matches!(result, Err(SeedError::Store(_))));
    for table in ["users", "customers", "invoices", "revenue"] {
        assert!(
            !table_exists(&pool, &schema, table).await,
            "{table} should have been rolled back"
        );
    }

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_parallel_seeds_in_separate_schemas() {
    let (schema_a, schema_b) = (test_schema(), test_schema());
    let (Some(pool_a), Some(pool_b)) =
        tokio::join!(get_test_pool(&schema_a), get_test_pool(&schema_b))
    else {
        return;
    };
    let (db_a, db_b) = (Database::new(pool_a.clone()), Database::new(pool_b.clone()));
    let seeder = seeder(SeedDataset::placeholder().unwrap());

    let (a, b) = tokio::join!(seeder.run(&db_a), seeder.run(&db_b));

    assert_eq!(a.expect("Seed in first schema failed").total_inserted(), 32);
    assert_eq!(b.expect("Seed in second schema failed").total_inserted(), 32);

    let extension_schema: String = sqlx::query_scalar(
        "SELECT n.nspname::text FROM pg_extension e \
         JOIN pg_namespace n ON n.oid = e.extnamespace WHERE e.extname = 'uuid-ossp'",
    )
    .fetch_one(&pool_a)
    .await
    .unwrap();
    assert_eq!(extension_schema, "public");

    cleanup_schema(&pool_a, &schema_a).await;
    cleanup_schema(&pool_b, &schema_b).await;
}
