//! Idempotent database seeding.
//!
//! The [`Seeder`] provisions the `users`, `customers`, `invoices` and
//! `revenue` tables and inserts a fixed dataset with conflict-do-nothing
//! semantics, all inside one transaction opened on a [`SeedStore`].
//! Each table carries an [`InsertPolicy`]: revenue rows are written one at a
//! time in input order, every other table is written concurrently.

pub mod memory;
mod seeder;
pub mod statement;
mod store;

pub use memory::{JournalEntry, MemoryStore};
pub use seeder::{SeedError, SeedReport, SeedTarget, Seeder, TableReport};
pub use statement::{InsertPolicy, SqlValue, Statement, StatementKind, Table};
pub use store::{PgSeedSession, SeedSession, SeedStore};
