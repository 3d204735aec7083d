//! Fixture data for the Acme dashboard.
//!
//! This crate holds the rows the dashboard seeder writes: one login user, a
//! handful of customers, their invoices and twelve months of revenue. The
//! bundled fixture can be replaced by a JSON file with the same layout, and
//! grown with synthetic customers and invoices.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let mut dataset = SeedDataset::placeholder()?;
//! extend_with_synthetic(&mut dataset, 10, 200, &mut rng)?;
//! ```

pub mod dataset;
pub mod generators;

pub use dataset::{
    CustomerRecord, DatasetError, InvoiceRecord, InvoiceStatus, RevenueRecord, SeedDataset,
    UserRecord,
};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::dataset::{
        CustomerRecord, DatasetError, InvoiceRecord, InvoiceStatus, RevenueRecord, SeedDataset,
        UserRecord,
    };
    pub use crate::generators::{
        CustomerGenerator, InvoiceGenConfig, InvoiceGenerator, extend_with_synthetic,
    };
}
