//! API Routes
//!
//! Configures the Axum router with all image cache endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_image_handler, clear_api_key_handler, clear_images_handler, credential_status_handler,
    enhance_handler, enhance_upload_handler, get_image_handler, get_payload_handler,
    get_raw_handler, health_handler, list_images_handler, profiles_handler,
    remove_image_handler, set_api_key_handler, size_handler, sweep_handler, AppState,
};

/// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /images` - Cache an uploaded image (multipart `file`)
/// - `GET /images` - List live images (metadata only)
/// - `DELETE /images` - Clear the cache
/// - `GET /images/size` - Count and total bytes
/// - `GET /images/:id` - Full entry with content
/// - `GET /images/:id/payload` - Base64 payload
/// - `GET /images/:id/raw` - Decoded image bytes
/// - `DELETE /images/:id` - Remove an entry
/// - `POST /maintenance/sweep` - Delete expired entries
/// - `GET|PUT|DELETE /credentials` - API key slot
/// - `POST /enhance` - Enhance a prompt, optionally with a cached image
/// - `POST /enhance/upload` - Enhance a prompt from an uncached upload
/// - `GET /profiles` - Role profiles from the analysis backend
/// - `GET /health` - Health check endpoint, including backend reachability
///
/// # Middleware
/// - Body limit sized to the store's file cap
/// - CORS: Allows any origin, the browser extension calls from page origins
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.store.options().max_file_size + MULTIPART_OVERHEAD;

    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/images",
            post(cache_image_handler)
                .get(list_images_handler)
                .delete(clear_images_handler),
        )
        .route("/images/size", get(size_handler))
        .route(
            "/images/:id",
            get(get_image_handler).delete(remove_image_handler),
        )
        .route("/images/:id/payload", get(get_payload_handler))
        .route("/images/:id/raw", get(get_raw_handler))
        .route("/maintenance/sweep", post(sweep_handler))
        .route(
            "/credentials",
            put(set_api_key_handler)
                .get(credential_status_handler)
                .delete(clear_api_key_handler),
        )
        .route("/enhance", post(enhance_handler))
        .route("/enhance/upload", post(enhance_upload_handler))
        .route("/profiles", get(profiles_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
