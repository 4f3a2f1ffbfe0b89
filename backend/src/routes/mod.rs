//! Route definitions for the Beverage Distribution Manager
//!
//! Route groups are gated by role. Layers added later run first, so every
//! protected group adds its role gate before the authentication layer.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    auth, beverage, health, inventory, order, product, reference, reporting, role, site, stream,
    user,
};
use crate::middleware::{auth_middleware, require_admin};
use crate::AppState;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(health::health_check))
        .nest("/auth", auth_routes(state.clone()))
        // Any signed-in user; handlers check area and site
        .merge(session_routes(state.clone()))
        // Administration
        .nest("/roles", role_routes(state.clone()))
        .nest("/sites", site_routes(state.clone()))
        .nest("/beverage-types", beverage_type_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/reports", report_routes(state.clone()))
        .nest("/products", product_routes(state))
}

/// Authentication routes: login and refresh are public
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .merge(protected)
}

/// Reference data, live feed, inventory and orders
fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reference", get(reference::get_reference))
        .route("/stream", get(stream::subscribe))
        .route("/inventory/:site_id", get(inventory::list_snapshots))
        .route(
            "/inventory/:site_id/:date",
            get(inventory::get_inventory).put(inventory::save_inventory),
        )
        .route("/orders", get(order::list_orders).post(order::create_order))
        .route("/orders/:order_id", get(order::get_order))
        .route("/orders/:order_id/cancel", post(order::cancel_order))
        .route("/orders/:order_id/deliver", post(order::deliver_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product reads are open to staff; handlers restrict writes to administrators
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(product::list_products).post(product::create_product))
        .route(
            "/:product_id",
            get(product::get_product)
                .put(product::update_product)
                .delete(product::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn role_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(role::list_roles).post(role::create_role))
        .route(
            "/:role_id",
            get(role::get_role)
                .put(role::update_role)
                .delete(role::delete_role),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn site_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(site::list_sites).post(site::create_site))
        .route(
            "/:site_id",
            get(site::get_site)
                .put(site::update_site)
                .delete(site::delete_site),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn beverage_type_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(beverage::list_beverage_types).post(beverage::create_beverage_type),
        )
        .route(
            "/:beverage_type_id",
            get(beverage::get_beverage_type)
                .put(beverage::update_beverage_type)
                .delete(beverage::delete_beverage_type),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route(
            "/:user_id",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sales-summary", get(reporting::get_sales_summary))
        .route(
            "/inventory-summary/:site_id/:date",
            get(reporting::get_inventory_summary),
        )
        .route("/sales.csv", get(reporting::export_sales_csv))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
