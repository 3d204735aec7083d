//! Fixture records and the dataset that groups them.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use tracing::warn;
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Longest month code the `revenue.month` column accepts.
pub const MAX_MONTH_CODE_LEN: usize = 4;

const PLACEHOLDER_DATA: &str = include_str!("../fixtures/placeholder-data.json");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Month code '{0}' is longer than {max} characters", max = MAX_MONTH_CODE_LEN)]
    MonthCodeTooLong(String),
    #[error("Duplicate user email: {0}")]
    DuplicateEmail(String),
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// A user with a plaintext password; hashing happens at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Invoice state as stored in `invoices.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Amount in cents.
    pub amount: i32,
    pub status: InvoiceStatus,
    #[serde(with = "iso_date")]
    pub date: Date,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub month: String,
    pub revenue: i32,
}

/// The full set of rows the seeder writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedDataset {
    pub users: Vec<UserRecord>,
    pub customers: Vec<CustomerRecord>,
    pub invoices: Vec<InvoiceRecord>,
    pub revenue: Vec<RevenueRecord>,
}

impl SeedDataset {
    /// Returns the dataset bundled with the crate.
    pub fn placeholder() -> Result<Self, DatasetError> {
        Self::from_json(PLACEHOLDER_DATA)
    }

    /// Loads a dataset from a JSON file with the same layout as the bundled fixture.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        let dataset: SeedDataset = serde_json::from_str(raw)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Checks the constraints the store would otherwise reject mid-transaction.
    ///
    /// Invoices pointing at unknown customers are only reported, the schema
    /// does not enforce the reference.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if let Some(rev) = self
            .revenue
            .iter()
            .find(|r| r.month.chars().count() > MAX_MONTH_CODE_LEN)
        {
            return Err(DatasetError::MonthCodeTooLong(rev.month.clone()));
        }

        let mut emails = HashSet::new();
        for user in &self.users {
            if !emails.insert(user.email.as_str()) {
                return Err(DatasetError::DuplicateEmail(user.email.clone()));
            }
        }

        let customer_ids: HashSet<Uuid> = self.customers.iter().map(|c| c.id).collect();
        let orphans = self
            .invoices
            .iter()
            .filter(|i| !customer_ids.contains(&i.customer_id))
            .count();
        if orphans > 0 {
            warn!("{} invoices reference customers missing from the dataset", orphans);
        }

        Ok(())
    }

    /// Total number of rows across all four tables.
    pub fn row_count(&self) -> usize {
        self.users.len() + self.customers.len() + self.invoices.len() + self.revenue.len()
    }
}
