//! Transactional store abstraction the seeder writes through.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use super::statement::{SqlValue, Statement};
use crate::database::Database;

/// A store that can open an all-or-nothing seeding session.
#[async_trait]
pub trait SeedStore: Send + Sync {
    type Session: SeedSession;

    async fn begin(&self) -> Result<Self::Session, sqlx::Error>;
}

/// One open transaction.
///
/// Dropping a session without calling [`SeedSession::commit`] rolls back
/// everything it executed.
#[async_trait]
pub trait SeedSession: Send + Sync {
    /// Executes a statement and returns the number of rows it affected.
    async fn execute(&self, statement: Statement) -> Result<u64, sqlx::Error>;

    async fn commit(self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL session over a single transactional connection.
///
/// Statements issued concurrently are queued on the connection lock.
pub struct PgSeedSession {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl SeedStore for Database {
    type Session = PgSeedSession;

    async fn begin(&self) -> Result<PgSeedSession, sqlx::Error> {
        let tx = self.pool().begin().await?;
        Ok(PgSeedSession { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl SeedSession for PgSeedSession {
    async fn execute(&self, statement: Statement) -> Result<u64, sqlx::Error> {
        let mut query = sqlx::query(statement.sql);
        for param in statement.params {
            query = match param {
                SqlValue::Uuid(v) => query.bind(v),
                SqlValue::Text(v) => query.bind(v),
                SqlValue::Int(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
            };
        }

        let mut tx = self.tx.lock().await;
        let result = query.execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().commit().await
    }
}
