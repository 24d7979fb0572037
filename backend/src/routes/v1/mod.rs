/// Campaign record handlers
pub mod records;

use aide::axum::{
    routing::{get, post, put},
    ApiRouter,
};

/// Creates the v1 API router with all v1 handler routes
///
/// Every route is generic over the entity type in its first path segment.
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route("/{entity}", put(records::put_record))
        .api_route("/{entity}/list", post(records::list_records))
        .api_route("/{entity}/batch-get", post(records::batch_get_records))
        .api_route(
            "/{entity}/{id}",
            get(records::get_record).delete(records::delete_record),
        )
        .api_route("/{entity}/{id}/move", post(records::move_id))
}
