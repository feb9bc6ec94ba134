use axum::{extract::State, http::HeaderMap, Json};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::services::BootstrapOutcome;

/// POST /admin/bootstrap - promote the first verified user to admin
///
/// Requires a real user token; the shared secret has no user to promote.
pub async fn bootstrap(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<BootstrapOutcome>> {
    let identity = state.gate.identify_user(&headers).await.map_err(|rejection| {
        tracing::warn!("bootstrap rejected: {}", rejection.reason());
        rejection
    })?;
    Ok(Json(state.users.bootstrap(&identity).await?))
}
