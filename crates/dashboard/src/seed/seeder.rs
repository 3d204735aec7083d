//! Seeding orchestration.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::try_join_all;
use seed_data::{CustomerRecord, InvoiceRecord, RevenueRecord, SeedDataset, UserRecord};
use thiserror::Error;
use tracing::{debug, error, info};

use super::statement::{InsertPolicy, SqlValue, Statement, Table};
use super::store::{SeedSession, SeedStore};
use crate::auth::PasswordHasher;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Seeding did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Insert counts for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableReport {
    pub attempted: usize,
    /// Rows actually written; conflicting rows are skipped.
    pub inserted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: TableReport,
    pub customers: TableReport,
    pub invoices: TableReport,
    pub revenue: TableReport,
}

impl SeedReport {
    pub fn total_inserted(&self) -> u64 {
        self.users.inserted + self.customers.inserted + self.invoices.inserted + self.revenue.inserted
    }
}

/// Object-safe handle on a [`SeedStore`], for sharing a store behind `dyn`.
#[async_trait]
pub trait SeedTarget: Send + Sync {
    async fn seed(&self, seeder: &Seeder) -> Result<SeedReport, SeedError>;
}

#[async_trait]
impl<S: SeedStore> SeedTarget for S {
    async fn seed(&self, seeder: &Seeder) -> Result<SeedReport, SeedError> {
        seeder.run(self).await
    }
}

/// Writes a fixed dataset into a [`SeedStore`] inside one transaction.
#[derive(Clone)]
pub struct Seeder {
    dataset: Arc<SeedDataset>,
    hasher: PasswordHasher,
    timeout: Duration,
}

impl Seeder {
    pub fn new(dataset: SeedDataset, hasher: PasswordHasher) -> Self {
        Self {
            dataset: Arc::new(dataset),
            hasher,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the upper bound for the whole transaction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dataset(&self) -> &SeedDataset {
        &self.dataset
    }

    /// Seeds users, customers, invoices and revenue, in that order.
    ///
    /// Either every table is seeded and committed, or the transaction is
    /// rolled back and the first error is returned.
    pub async fn run<S: SeedStore>(&self, store: &S) -> Result<SeedReport, SeedError> {
        info!("Starting seed transaction");

        let report = tokio::time::timeout(self.timeout, self.run_transaction(store))
            .await
            .map_err(|_| SeedError::TimedOut(self.timeout))??;

        info!(
            "Seed transaction committed, {} new rows",
            report.total_inserted()
        );
        Ok(report)
    }

    async fn run_transaction<S: SeedStore>(&self, store: &S) -> Result<SeedReport, SeedError> {
        let session = store.begin().await?;

        let users = self.seed_users(&session, &self.dataset.users).await?;
        debug!("Users seeded, seeding customers");
        let customers = self.seed_customers(&session, &self.dataset.customers).await?;
        debug!("Customers seeded, seeding invoices");
        let invoices = self.seed_invoices(&session, &self.dataset.invoices).await?;
        debug!("Invoices seeded, seeding revenue");
        let revenue = self.seed_revenue(&session, &self.dataset.revenue).await?;

        session.commit().await?;

        Ok(SeedReport {
            users,
            customers,
            invoices,
            revenue,
        })
    }

    /// Seeds users, hashing each password first.
    pub async fn seed_users<T: SeedSession>(
        &self,
        session: &T,
        users: &[UserRecord],
    ) -> Result<TableReport, SeedError> {
        info!("Seeding {} users...", users.len());
        provision(session, Table::Users).await?;

        // Hashing is CPU bound, run it on the blocking pool
        let statements = try_join_all(users.iter().map(|user| {
            let hasher = self.hasher.clone();
            let UserRecord {
                id,
                name,
                email,
                password,
            } = user.clone();
            async move {
                let hashed = tokio::task::spawn_blocking(move || hasher.hash_password(&password))
                    .await
                    .map_err(|e| SeedError::Hashing(e.to_string()))?
                    .map_err(|e| SeedError::Hashing(e.to_string()))?;

                Ok::<_, SeedError>(Statement::insert(
                    Table::Users,
                    vec![
                        SqlValue::Uuid(id),
                        SqlValue::Text(name),
                        SqlValue::Text(email),
                        SqlValue::Text(hashed),
                    ],
                ))
            }
        }))
        .await?;

        let report = insert_rows(session, Table::Users, statements).await?;
        info!("Seeded {}/{} users", report.inserted, report.attempted);
        Ok(report)
    }

    pub async fn seed_customers<T: SeedSession>(
        &self,
        session: &T,
        customers: &[CustomerRecord],
    ) -> Result<TableReport, SeedError> {
        info!("Seeding {} customers...", customers.len());
        provision(session, Table::Customers).await?;

        let statements = customers
            .iter()
            .map(|c| {
                Statement::insert(
                    Table::Customers,
                    vec![
                        SqlValue::Uuid(c.id),
                        SqlValue::Text(c.name.clone()),
                        SqlValue::Text(c.email.clone()),
                        SqlValue::Text(c.image_url.clone()),
                    ],
                )
            })
            .collect();

        let report = insert_rows(session, Table::Customers, statements).await?;
        info!("Seeded {}/{} customers", report.inserted, report.attempted);
        Ok(report)
    }

    pub async fn seed_invoices<T: SeedSession>(
        &self,
        session: &T,
        invoices: &[InvoiceRecord],
    ) -> Result<TableReport, SeedError> {
        info!("Seeding {} invoices...", invoices.len());
        provision(session, Table::Invoices).await?;

        let statements = invoices
            .iter()
            .map(|i| {
                Statement::insert(
                    Table::Invoices,
                    vec![
                        SqlValue::Uuid(i.id),
                        SqlValue::Uuid(i.customer_id),
                        SqlValue::Int(i.amount),
                        SqlValue::Text(i.status.as_str().to_string()),
                        SqlValue::Date(i.date),
                    ],
                )
            })
            .collect();

        let report = insert_rows(session, Table::Invoices, statements).await?;
        info!("Seeded {}/{} invoices", report.inserted, report.attempted);
        Ok(report)
    }

    pub async fn seed_revenue<T: SeedSession>(
        &self,
        session: &T,
        revenue: &[RevenueRecord],
    ) -> Result<TableReport, SeedError> {
        info!("Seeding {} revenue entries...", revenue.len());
        provision(session, Table::Revenue).await?;

        let statements = revenue
            .iter()
            .map(|r| {
                Statement::insert(
                    Table::Revenue,
                    vec![SqlValue::Text(r.month.clone()), SqlValue::Int(r.revenue)],
                )
            })
            .collect();

        let report = insert_rows(session, Table::Revenue, statements).await?;
        info!("Seeded {}/{} revenue entries", report.inserted, report.attempted);
        Ok(report)
    }
}

async fn provision<T: SeedSession>(session: &T, table: Table) -> Result<(), SeedError> {
    session.execute(Statement::create_extension()).await?;
    debug!("Checked/created uuid-ossp extension for {}", table);
    session.execute(Statement::create_table(table)).await?;
    info!("{} table created or already exists", table);
    Ok(())
}

/// Issues the inserts for one table according to its [`InsertPolicy`].
async fn insert_rows<T: SeedSession>(
    session: &T,
    table: Table,
    statements: Vec<Statement>,
) -> Result<TableReport, SeedError> {
    let attempted = statements.len();

    let inserted: u64 = match table.insert_policy() {
        InsertPolicy::Concurrent => try_join_all(statements.into_iter().map(|s| session.execute(s)))
            .await?
            .into_iter()
            .sum(),
        InsertPolicy::Sequential => {
            let mut inserted = 0;
            for (i, statement) in statements.into_iter().enumerate() {
                let values = statement
                    .params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                info!("[{}] Processing item {}/{}: {}", table, i + 1, attempted, values);

                match session.execute(statement).await {
                    Ok(rows) => {
                        inserted += rows;
                        info!("[{}] Processed item {}/{}", table, i + 1, attempted);
                    }
                    Err(e) => {
                        error!("[{}] Failed item {}/{} ({}): {}", table, i + 1, attempted, values, e);
                        return Err(e.into());
                    }
                }
            }
            inserted
        }
    };

    Ok(TableReport { attempted, inserted })
}
