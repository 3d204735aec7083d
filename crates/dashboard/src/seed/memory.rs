//! In-memory seed store.
//!
//! Mirrors the PostgreSQL behavior the seeder relies on: the extension must
//! exist before tables with generated ids, inserts ignore key conflicts, user
//! emails are unique and month codes fit in four characters. Every executed
//! statement is journaled, including ones from sessions that are later rolled
//! back. Used by the `seed` binary's dry-run mode and by tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;

use super::statement::{SqlValue, Statement, StatementKind, Table};
use super::store::{SeedSession, SeedStore};
use crate::{
    cards::{CardData, CardDataSource},
    errors::AppError,
};

/// One statement as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub kind: StatementKind,
    pub key: Option<String>,
    /// Rows affected, or `None` when the statement failed.
    pub rows_affected: Option<u64>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    extension: bool,
    tables: HashMap<Table, BTreeMap<String, Vec<SqlValue>>>,
}

#[derive(Debug, Clone)]
struct Failure {
    kind: StatementKind,
    key: Option<String>,
}

#[derive(Default)]
struct Shared {
    committed: Mutex<MemoryState>,
    journal: Mutex<Vec<JournalEntry>>,
    failures: Mutex<Vec<Failure>>,
    latency: Mutex<Option<Duration>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement of `kind` fail. With a `key`, only inserts of
    /// that key fail.
    pub fn fail_on(&self, kind: StatementKind, key: Option<&str>) {
        lock(&self.shared.failures).push(Failure {
            kind,
            key: key.map(str::to_string),
        });
    }

    /// Delays every statement, simulating a slow or hung database.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.shared.latency) = Some(latency);
    }

    pub fn row_count(&self, table: Table) -> usize {
        lock(&self.shared.committed)
            .tables
            .get(&table)
            .map_or(0, BTreeMap::len)
    }

    /// Committed rows of `table`, keyed by their conflict key.
    pub fn rows(&self, table: Table) -> BTreeMap<String, Vec<SqlValue>> {
        lock(&self.shared.committed)
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn table_exists(&self, table: Table) -> bool {
        lock(&self.shared.committed).tables.contains_key(&table)
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        lock(&self.shared.journal).clone()
    }

    /// Keys of the inserts attempted against `table`, in execution order.
    pub fn insert_attempts(&self, table: Table) -> Vec<String> {
        lock(&self.shared.journal)
            .iter()
            .filter(|e| e.kind == StatementKind::Insert(table))
            .filter_map(|e| e.key.clone())
            .collect()
    }

    fn injected_failure(&self, statement: &Statement) -> Option<sqlx::Error> {
        let key = statement.key();
        lock(&self.shared.failures)
            .iter()
            .find(|f| f.kind == statement.kind && (f.key.is_none() || f.key == key))
            .map(|f| {
                sqlx::Error::Protocol(format!(
                    "injected failure for {:?} {}",
                    f.kind,
                    key.as_deref().unwrap_or("")
                ))
            })
    }
}

/// Aggregates over committed rows, failing like PostgreSQL when the tables
/// have not been created yet.
#[async_trait]
impl CardDataSource for MemoryStore {
    async fn fetch_card_data(&self) -> Result<CardData, AppError> {
        let state = lock(&self.shared.committed);
        let missing = |table: Table| {
            AppError::Database(sqlx::Error::Protocol(format!(
                "relation \"{table}\" does not exist"
            )))
        };
        let invoices = state
            .tables
            .get(&Table::Invoices)
            .ok_or_else(|| missing(Table::Invoices))?;
        let customers = state
            .tables
            .get(&Table::Customers)
            .ok_or_else(|| missing(Table::Customers))?;

        let total_for = |status: &str| -> i64 {
            invoices
                .values()
                .filter(|row| matches!(row.get(3), Some(SqlValue::Text(s)) if s == status))
                .filter_map(|row| match row.get(2) {
                    Some(SqlValue::Int(amount)) => Some(i64::from(*amount)),
                    _ => None,
                })
                .sum()
        };

        Ok(CardData {
            total_paid_invoices: total_for("paid"),
            total_pending_invoices: total_for("pending"),
            number_of_invoices: invoices.len() as i64,
            number_of_customers: customers.len() as i64,
        })
    }
}

pub struct MemorySession {
    store: MemoryStore,
    staged: Mutex<MemoryState>,
}

#[async_trait]
impl SeedStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, sqlx::Error> {
        let snapshot = lock(&self.shared.committed).clone();
        Ok(MemorySession {
            store: self.clone(),
            staged: Mutex::new(snapshot),
        })
    }
}

impl MemorySession {
    fn apply(&self, statement: &Statement) -> Result<u64, sqlx::Error> {
        if let Some(err) = self.store.injected_failure(statement) {
            return Err(err);
        }

        let mut state = lock(&self.staged);
        match statement.kind {
            StatementKind::CreateExtension => {
                state.extension = true;
                Ok(0)
            }
            StatementKind::CreateTable(table) => {
                if table != Table::Revenue && !state.extension {
                    return Err(sqlx::Error::Protocol(
                        "function uuid_generate_v4() does not exist".to_string(),
                    ));
                }
                state.tables.entry(table).or_default();
                Ok(0)
            }
            StatementKind::Insert(table) => {
                let key = statement.key().ok_or_else(|| {
                    sqlx::Error::Protocol(format!("insert into {table} without a key"))
                })?;
                let rows = state.tables.get_mut(&table).ok_or_else(|| {
                    sqlx::Error::Protocol(format!("relation \"{table}\" does not exist"))
                })?;

                if rows.contains_key(&key) {
                    return Ok(0);
                }
                match table {
                    Table::Users => {
                        let email = statement.params.get(2);
                        if rows.values().any(|row| row.get(2) == email) {
                            return Err(sqlx::Error::Protocol(
                                "duplicate key value violates unique constraint \"users_email_key\""
                                    .to_string(),
                            ));
                        }
                    }
                    Table::Revenue if key.chars().count() > 4 => {
                        return Err(sqlx::Error::Protocol(
                            "value too long for type character varying(4)".to_string(),
                        ));
                    }
                    _ => {}
                }

                rows.insert(key, statement.params.clone());
                Ok(1)
            }
        }
    }
}

#[async_trait]
impl SeedSession for MemorySession {
    async fn execute(&self, statement: Statement) -> Result<u64, sqlx::Error> {
        let latency = *lock(&self.store.shared.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let result = self.apply(&statement);
        lock(&self.store.shared.journal).push(JournalEntry {
            kind: statement.kind,
            key: statement.key(),
            rows_affected: result.as_ref().ok().copied(),
        });
        result
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        let staged = self
            .staged
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *lock(&self.store.shared.committed) = staged;
        Ok(())
    }
}
