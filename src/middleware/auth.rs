use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Domain resources: the shared secret or any valid access token.
///
/// The resolved [`Caller`](crate::auth::Caller) is stored in the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = state.gate.authenticate(request.headers()).await?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Admin surface: the shared secret or a valid token whose profile holds the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = state.gate.authorize_admin(request.headers()).await?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
