//! Shared types and models for the Beverage Distribution Manager
//!
//! This crate contains the domain arithmetic shared between the backend and
//! the browser (via WASM): box/unit conversion, stock reservation, transit
//! inference, draft staging and the reporting reducers.

pub mod aggregation;
pub mod draft;
pub mod filter;
pub mod models;
pub mod quantity;
pub mod reconciliation;
pub mod types;
pub mod validation;

pub use models::*;
pub use quantity::*;
pub use types::*;
pub use validation::*;
