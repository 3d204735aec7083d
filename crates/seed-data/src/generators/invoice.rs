//! Invoice generation with realistic amount spread.

use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use time::{Date, Duration, Month};

use super::customer::random_uuid;
use crate::dataset::{CustomerRecord, DatasetError, InvoiceRecord, InvoiceStatus};

/// Configuration for invoice generation.
#[derive(Debug, Clone)]
pub struct InvoiceGenConfig {
    /// Probability that an invoice is already paid.
    pub paid_ratio: f64,
    /// Mean of ln(amount in cents).
    pub amount_log_mean: f64,
    /// Standard deviation of ln(amount in cents).
    pub amount_log_std: f64,
    /// Earliest invoice date.
    pub start: Date,
    /// Latest invoice date (inclusive).
    pub end: Date,
}

impl Default for InvoiceGenConfig {
    fn default() -> Self {
        Self {
            paid_ratio: 0.6,
            // Median around $80, long tail into the hundreds
            amount_log_mean: 9.0,
            amount_log_std: 1.2,
            start: Date::from_calendar_date(2022, Month::June, 1).unwrap_or(Date::MIN),
            end: Date::from_calendar_date(2023, Month::December, 31).unwrap_or(Date::MAX),
        }
    }
}

/// Generates invoices for an existing set of customers.
pub struct InvoiceGenerator {
    config: InvoiceGenConfig,
    amounts: LogNormal<f64>,
}

impl InvoiceGenerator {
    pub fn new() -> Result<Self, DatasetError> {
        Self::with_config(InvoiceGenConfig::default())
    }

    pub fn with_config(config: InvoiceGenConfig) -> Result<Self, DatasetError> {
        if !(0.0..=1.0).contains(&config.paid_ratio) {
            return Err(DatasetError::InvalidConfig(format!(
                "paid_ratio {} outside 0..=1",
                config.paid_ratio
            )));
        }
        if config.end < config.start {
            return Err(DatasetError::InvalidConfig(
                "end date precedes start date".to_string(),
            ));
        }
        let amounts = LogNormal::new(config.amount_log_mean, config.amount_log_std)
            .map_err(|e| DatasetError::InvalidConfig(e.to_string()))?;

        Ok(Self { config, amounts })
    }

    /// Generates `count` invoices spread across `customers`.
    ///
    /// Returns an empty list when there are no customers to bill.
    pub fn generate_batch(
        &self,
        customers: &[CustomerRecord],
        count: usize,
        rng: &mut impl Rng,
    ) -> Vec<InvoiceRecord> {
        if customers.is_empty() {
            return Vec::new();
        }

        let span_days = (self.config.end - self.config.start).whole_days();

        (0..count)
            .map(|_| {
                let customer = &customers[rng.gen_range(0..customers.len())];
                let amount = self.amounts.sample(rng).clamp(100.0, i32::MAX as f64) as i32;
                let status = if rng.r#gen::<f64>() < self.config.paid_ratio {
                    InvoiceStatus::Paid
                } else {
                    InvoiceStatus::Pending
                };
                let date = self.config.start + Duration::days(rng.gen_range(0..=span_days));

                InvoiceRecord {
                    id: random_uuid(rng),
                    customer_id: customer.id,
                    amount,
                    status,
                    date,
                }
            })
            .collect()
    }
}
