//! HTTP request handlers

use serde::Deserialize;

pub mod auth;
pub mod beverage;
pub mod health;
pub mod inventory;
pub mod order;
pub mod product;
pub mod reference;
pub mod reporting;
pub mod role;
pub mod site;
pub mod stream;
pub mod user;

/// Free-text search box of the master-data tables
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
