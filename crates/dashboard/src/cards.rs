//! Dashboard summary cards.
//!
//! The card wrapper never fails: if the aggregate metrics cannot be fetched
//! it waits [`MIN_PERCEIVED_LATENCY`] and renders [`PLACEHOLDER_CARD_DATA`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Delay before fallback content is shown, so a fast failure does not flash
/// placeholder numbers. Not a retry.
pub const MIN_PERCEIVED_LATENCY: Duration = Duration::from_secs(1);

pub const PLACEHOLDER_CARD_DATA: CardData = CardData {
    total_paid_invoices: 12,
    total_pending_invoices: 6,
    number_of_invoices: 25,
    number_of_customers: 55,
};

/// Aggregate metrics shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    /// Sum of paid invoice amounts, in cents.
    pub total_paid_invoices: i64,
    /// Sum of pending invoice amounts, in cents.
    pub total_pending_invoices: i64,
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Collected,
    Pending,
    Invoices,
    Customers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Card {
    pub title: String,
    pub value: i64,
    #[serde(rename = "type")]
    pub kind: CardKind,
}

impl Card {
    fn new(title: &str, value: i64, kind: CardKind) -> Self {
        Self {
            title: title.to_string(),
            value,
            kind,
        }
    }
}

impl CardData {
    /// The four cards in display order.
    pub fn cards(&self) -> Vec<Card> {
        vec![
            Card::new("Collected", self.total_paid_invoices, CardKind::Collected),
            Card::new("Pending", self.total_pending_invoices, CardKind::Pending),
            Card::new("Total Invoices", self.number_of_invoices, CardKind::Invoices),
            Card::new("Total Customers", self.number_of_customers, CardKind::Customers),
        ]
    }
}

/// Source of the aggregate metrics.
#[async_trait]
pub trait CardDataSource: Send + Sync {
    async fn fetch_card_data(&self) -> Result<CardData, AppError>;
}

/// Fetches the metrics once and renders them, falling back to placeholders.
pub async fn cards_wrapper(source: &dyn CardDataSource) -> Vec<Card> {
    let data = match source.fetch_card_data().await {
        Ok(data) => data,
        Err(e) => {
            warn!("Card data unavailable, showing placeholders: {e}");
            tokio::time::sleep(MIN_PERCEIVED_LATENCY).await;
            PLACEHOLDER_CARD_DATA
        }
    };
    debug!("Collected: {}", data.total_paid_invoices);

    data.cards()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    struct Fixed(Result<CardData, ()>);

    #[async_trait]
    impl CardDataSource for Fixed {
        async fn fetch_card_data(&self) -> Result<CardData, AppError> {
            self.0.map_err(|_| AppError::Internal)
        }
    }

    fn values(cards: &[Card]) -> Vec<(&str, i64)> {
        cards.iter().map(|c| (c.title.as_str(), c.value)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_renders_placeholder_after_delay() {
        let start = Instant::now();
        let cards = cards_wrapper(&Fixed(Err(()))).await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(
            values(&cards),
            vec![
                ("Collected", 12),
                ("Pending", 6),
                ("Total Invoices", 25),
                ("Total Customers", 55),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_renders_without_delay() {
        let data = CardData {
            total_paid_invoices: 40,
            total_pending_invoices: 5,
            number_of_invoices: 10,
            number_of_customers: 3,
        };
        let start = Instant::now();
        let cards = cards_wrapper(&Fixed(Ok(data))).await;

        assert!(start.elapsed() < MIN_PERCEIVED_LATENCY);
        assert_eq!(
            values(&cards),
            vec![
                ("Collected", 40),
                ("Pending", 5),
                ("Total Invoices", 10),
                ("Total Customers", 3),
            ]
        );
    }

    #[test]
    fn test_card_serialization() {
        let card = Card::new("Pending", 6, CardKind::Pending);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Pending", "value": 6, "type": "pending"})
        );
    }

    #[test]
    fn test_card_data_uses_camel_case() {
        let json = serde_json::to_value(PLACEHOLDER_CARD_DATA).unwrap();
        assert_eq!(json["totalPaidInvoices"], 12);
        assert_eq!(json["numberOfCustomers"], 55);
    }
}
