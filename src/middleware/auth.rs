use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::SharedAccess;
use crate::error::ApiError;

/// Resolve the caller once per request and store it in the request extensions.
/// Handlers read it back with `Extension<Caller>`.
pub async fn resolve_caller(
    State(access): State<SharedAccess>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = access.resolve(&headers).map_err(|e| {
        tracing::debug!("Rejected credentials: {}", e);
        ApiError::from(e)
    })?;

    tracing::debug!("Caller resolved (admin: {}, user: {:?})", caller.is_admin, caller.user_id);
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
