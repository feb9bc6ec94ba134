use std::collections::HashMap;

use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Storage collection resolved from the `:resource` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection(pub &'static str);

/// Reject unknown resource slugs with 404 before any authentication work.
pub async fn resolve_resource(
    State(state): State<AppState>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(params) = params?;
    let collection = params
        .get("resource")
        .and_then(|slug| state.resources.resolve_collection(slug))
        .ok_or_else(ApiError::not_found)?;
    request.extensions_mut().insert(Collection(collection));
    Ok(next.run(request).await)
}
