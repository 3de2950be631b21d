use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::SharedAccess;
use crate::config::AppConfig;
use crate::gateway::SharedGateway;
use crate::handlers::{protected::backend, public};
use crate::middleware::resolve_caller;
use crate::resources::catalog;

/// Collaborators shared by every request
#[derive(Clone)]
pub struct AppState {
    pub gateway: SharedGateway,
    pub access: SharedAccess,
}

impl AppState {
    pub fn new(gateway: SharedGateway, access: SharedAccess) -> Self {
        Self { gateway, access }
    }
}

/// Full route table: public probes plus one nested router per resource
pub fn router(state: AppState) -> Router {
    let backend_routes = catalog::ALL
        .iter()
        .fold(Router::new(), |router, &descriptor| {
            router.nest(
                &format!("/api/backend/{}", descriptor.name),
                backend::routes(descriptor, state.gateway.clone()),
            )
        })
        .layer(middleware::from_fn_with_state(state.access.clone(), resolve_caller));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/health", get(public::health))
        .route("/health/ready", get(public::ready))
        .with_state(state.gateway)
        // Protected
        .merge(backend_routes)
}

/// Global middleware driven by configuration
pub fn with_layers(router: Router, config: &AppConfig) -> Router {
    let mut router = router.layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
