//! Business logic services for the Beverage Distribution Manager

pub mod auth;
pub mod beverage;
pub mod inventory;
pub mod order;
pub mod product;
pub mod reference;
pub mod reporting;
pub mod role;
pub mod site;
pub mod user;

pub use auth::AuthService;
pub use beverage::BeverageTypeService;
pub use inventory::InventoryService;
pub use order::OrderService;
pub use product::ProductService;
pub use reference::ReferenceService;
pub use reporting::ReportingService;
pub use role::RoleService;
pub use site::SiteService;
pub use user::UserService;
