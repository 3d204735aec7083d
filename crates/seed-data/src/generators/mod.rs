//! Synthetic row generators.
//!
//! - [`CustomerGenerator`]: customers with fake names and avatar paths
//! - [`InvoiceGenerator`]: invoices billed to a given set of customers
//!
//! Both are used to grow the bundled fixture for load and dashboard testing.

pub mod customer;
pub mod invoice;

use rand::Rng;
use tracing::info;

pub use customer::CustomerGenerator;
pub use invoice::{InvoiceGenConfig, InvoiceGenerator};

use crate::dataset::{DatasetError, SeedDataset};

/// Appends synthetic customers and invoices to `dataset`.
///
/// New invoices are billed to both fixture and synthetic customers.
pub fn extend_with_synthetic(
    dataset: &mut SeedDataset,
    customers: usize,
    invoices: usize,
    rng: &mut impl Rng,
) -> Result<(), DatasetError> {
    let new_customers = CustomerGenerator::new().generate_batch(customers, rng);
    dataset.customers.extend(new_customers);

    let new_invoices = InvoiceGenerator::new()?.generate_batch(&dataset.customers, invoices, rng);
    let generated = new_invoices.len();
    dataset.invoices.extend(new_invoices);

    info!(
        "Added {} synthetic customers and {} synthetic invoices",
        customers, generated
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_placeholder() {
        let mut rng = rand::thread_rng();
        let mut dataset = SeedDataset::placeholder().unwrap();

        extend_with_synthetic(&mut dataset, 4, 20, &mut rng).unwrap();

        assert_eq!(dataset.customers.len(), 10);
        assert_eq!(dataset.invoices.len(), 33);
        assert_eq!(dataset.revenue.len(), 12);
        dataset.validate().unwrap();
    }
}
