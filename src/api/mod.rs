pub mod auth;
mod contacts;
mod error;
mod orders;
mod products;
mod receipts;
mod uploads;
mod users;
mod validation;

pub use error::{ok, ApiError, ApiResponse};

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/", post(users::register))
        .route("/", get(users::list_users))
        .route("/login", post(users::login))
        .route("/forgot-password", post(users::forgot_password))
        .route("/reset-password", post(users::reset_password))
        .route("/upload", post(users::upload_avatar))
        .route("/:id", get(users::get_user))
        .route("/:id", put(users::update_user))
        .route("/:id", delete(users::delete_user))
        .route("/:id/password", post(users::change_password));

    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/", post(products::create_product))
        .route("/:id", get(products::get_product))
        .route("/:id", put(products::update_product))
        .route("/:id", delete(products::delete_product));

    let order_routes = Router::new()
        .route("/", post(orders::create_order))
        .route("/", get(orders::list_orders))
        .route("/user/:user_id", get(orders::list_user_orders))
        .route("/:id", put(orders::update_order_status))
        .route("/:id", delete(orders::delete_order));

    let receipt_routes = Router::new()
        .route("/", get(receipts::list_receipts))
        .route("/:id", get(receipts::get_receipt));

    let contact_routes = Router::new()
        .route("/", post(contacts::create_contact))
        .route("/", get(contacts::list_contacts))
        .route("/:id", get(contacts::get_contact))
        .route("/:id", patch(contacts::update_contact))
        .route("/:id", delete(contacts::delete_contact))
        .route("/:id/reply", post(contacts::reply_contact));

    let uploads_dir = state.config.server.data_dir.join(uploads::UPLOADS_DIR);

    Router::new()
        .route("/health", get(health_check))
        .nest("/users", user_routes)
        .nest("/products", product_routes)
        .nest("/orders", order_routes)
        .nest("/receipts", receipt_routes)
        .nest("/contacts", contact_routes)
        .nest_service(uploads::UPLOADS_URL_PREFIX, ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
