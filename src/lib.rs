pub mod config;
pub mod credential;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;
pub mod translate;
pub mod websocket;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
pub fn build_app(state: AppState) -> Router {
    routes::create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
