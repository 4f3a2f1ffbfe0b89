//! Domain models for the Beverage Distribution Manager

mod beverage;
mod inventory;
mod order;
mod product;
mod reference;
mod role;
mod site;
mod user;

pub use beverage::*;
pub use inventory::*;
pub use order::*;
pub use product::*;
pub use reference::*;
pub use role::*;
pub use site::*;
pub use user::*;
