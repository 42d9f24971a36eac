pub mod conversations;
pub mod error;
pub mod fanout;
pub mod messages;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble both route groups over a shared store handle.
pub fn router(state: AppState) -> Router {
    let conversation_routes = Router::new()
        .route("/api/conversations/user/{user_id}", get(conversations::list_for_user));

    let message_routes = Router::new()
        .route("/api/messages/", post(messages::send_message))
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/conversation/{conversation_id}", get(messages::list_messages))
        .route(
            "/api/messages/conversation/{conversation_id}/before",
            get(messages::list_messages_before),
        );

    Router::new()
        .merge(conversation_routes)
        .merge(message_routes)
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
