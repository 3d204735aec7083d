//! Dashboard card handlers.

use std::sync::Arc;

use axum::{Extension, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cards::{Card, CardDataSource, cards_wrapper};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CardsResponse {
    pub cards: Vec<Card>,
}

/// Get the four dashboard summary cards.
///
/// Always succeeds; placeholder values are returned when the metrics
/// cannot be computed.
#[utoipa::path(
    get,
    path = "/dashboard/cards",
    tag = "dashboard",
    responses(
        (status = 200, description = "Summary cards", body = CardsResponse)
    )
)]
pub async fn get_cards(
    Extension(source): Extension<Arc<dyn CardDataSource>>,
) -> Json<CardsResponse> {
    let cards = cards_wrapper(source.as_ref()).await;
    Json(CardsResponse { cards })
}
