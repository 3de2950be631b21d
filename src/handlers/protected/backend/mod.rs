pub mod collection;
pub mod record;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::gateway::SharedGateway;
use crate::resources::{ResourceController, ResourceDescriptor};

/// Routes for one resource, to be nested under `/api/backend/<name>`.
/// Operations the descriptor does not expose answer 405.
pub fn routes(descriptor: &'static ResourceDescriptor, gateway: SharedGateway) -> Router {
    let controller = Arc::new(ResourceController::new(descriptor, gateway));

    let mut collection_routes = get(collection::get);
    if descriptor.creatable {
        collection_routes = collection_routes.post(collection::post);
    }

    let mut record_routes = get(record::get).patch(record::patch);
    if descriptor.supports_delete() {
        record_routes = record_routes.delete(record::delete);
    }

    Router::new()
        .route("/", collection_routes)
        .route("/:id", record_routes)
        .with_state(controller)
}
