//! Database seed trigger.

use std::sync::Arc;

use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::seed::{SeedError, SeedTarget, Seeder};

pub const SEED_SUCCESS_MESSAGE: &str = "Database seeded successfully";
pub const SEED_FAILURE_MESSAGE: &str = "Failed to seed database";

/// Controls what a failed seed exposes to the caller.
#[derive(Debug, Clone, Copy)]
pub struct SeedSettings {
    /// Include the error message and trace in failure responses. Leave off
    /// for anything reachable by untrusted callers.
    pub expose_diagnostics: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeedResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeedFailureResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Debug rendering of the error chain, with a backtrace when `RUST_BACKTRACE` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl SeedFailureResponse {
    fn from_error(err: SeedError, expose_diagnostics: bool) -> Self {
        if !expose_diagnostics {
            return Self {
                message: SEED_FAILURE_MESSAGE.to_string(),
                error: None,
                stack: None,
            };
        }

        let error = err.to_string();
        let stack = format!("{:?}", anyhow::Error::new(err));
        Self {
            message: SEED_FAILURE_MESSAGE.to_string(),
            error: Some(error),
            stack: Some(stack),
        }
    }
}

/// Seed the database with the fixture dataset.
#[utoipa::path(
    get,
    path = "/seed",
    tag = "seed",
    responses(
        (status = 200, description = "All tables seeded", body = SeedResponse),
        (status = 500, description = "Seeding failed and was rolled back", body = SeedFailureResponse)
    )
)]
pub async fn seed_database(
    Extension(target): Extension<Arc<dyn SeedTarget>>,
    Extension(seeder): Extension<Seeder>,
    Extension(settings): Extension<SeedSettings>,
) -> Response {
    info!("Seed requested");

    match target.seed(&seeder).await {
        Ok(report) => {
            info!(
                "Database seeded successfully ({} new rows)",
                report.total_inserted()
            );
            let body = SeedResponse {
                message: SEED_SUCCESS_MESSAGE.to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Error during seeding: {e:?}");
            let body = SeedFailureResponse::from_error(e, settings.expose_diagnostics);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
