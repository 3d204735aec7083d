//! HTTP request handlers for the dashboard API.

pub mod cards;
pub mod health;
pub mod seed;

pub use cards::{__path_get_cards, CardsResponse, get_cards};
pub use health::{__path_health_check, health_check, not_found};
pub use seed::{
    __path_seed_database, SEED_FAILURE_MESSAGE, SEED_SUCCESS_MESSAGE, SeedFailureResponse,
    SeedResponse, SeedSettings, seed_database,
};
