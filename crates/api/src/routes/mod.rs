pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/functions/v1` route tree.
///
/// ```text
/// /chat                   streaming chat (SSE)
/// /generate-image         text-to-image
/// /generate-menu-image    menu photo enhancement
/// /edit-image             image edit
/// ```
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/generate-image", post(handlers::images::generate_image))
        .route(
            "/generate-menu-image",
            post(handlers::images::generate_menu_image),
        )
        .route("/edit-image", post(handlers::images::edit_image))
}
