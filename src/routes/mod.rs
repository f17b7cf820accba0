pub mod api;
pub mod voice;

use std::sync::Arc;

use axum::{Router, middleware};

use crate::middleware::connection_limit_middleware;
use crate::state::AppState;

/// Assemble the application routes with their per-route middleware.
///
/// Server-wide layers (CORS, rate limiting, security headers) are added by the
/// binary. The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` because connection
/// limiting keys on the peer address.
pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let voice_routes = voice::create_voice_router().layer(middleware::from_fn_with_state(
        app_state.clone(),
        connection_limit_middleware,
    ));

    api::create_api_router()
        .merge(voice_routes)
        .with_state(app_state)
}
