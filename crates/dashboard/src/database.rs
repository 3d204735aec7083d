use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::{
    cards::{CardData, CardDataSource},
    config::AppConfig,
    errors::AppError,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with the configured TLS mode; `require` unless overridden.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let options = PgConnectOptions::from_str(&config.database_url)?.ssl_mode(config.ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn count_invoices(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_customers(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Returns (paid, pending) invoice totals in cents.
    pub async fn invoice_status_totals(&self) -> Result<(i64, i64), AppError> {
        let (paid, pending): (Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                SUM(CASE WHEN status = 'paid' THEN amount ELSE 0 END) AS paid,
                SUM(CASE WHEN status = 'pending' THEN amount ELSE 0 END) AS pending
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((paid.unwrap_or(0), pending.unwrap_or(0)))
    }
}

#[async_trait]
impl CardDataSource for Database {
    async fn fetch_card_data(&self) -> Result<CardData, AppError> {
        let (number_of_invoices, number_of_customers, (paid, pending)) = tokio::try_join!(
            self.count_invoices(),
            self.count_customers(),
            self.invoice_status_totals(),
        )?;

        Ok(CardData {
            total_paid_invoices: paid,
            total_pending_invoices: pending,
            number_of_invoices,
            number_of_customers,
        })
    }
}
