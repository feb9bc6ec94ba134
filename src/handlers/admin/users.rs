use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, State},
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Caller;
use crate::database::models::Profile;
use crate::error::ApiResult;
use crate::handlers::parse_json_body;
use crate::services::user_service::text_field;
use crate::services::{CreateUser, CreatedUser};

/// GET /admin/users - every profile, unpaginated
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    Ok(Json(state.users.list().await?))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<CreatedUser>> {
    let request = CreateUser::from_body(parse_json_body(&body?)?)?;
    let created = state.users.create(request).await?;
    tracing::debug!("user {} created by {}", created.id, caller_label(&caller));
    Ok(Json(created))
}

/// DELETE /admin/users - `user_id` travels in the body
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Value>> {
    let body = parse_json_body(&body?)?;
    let user_id = text_field(&body, "user_id");
    state.users.delete(&user_id).await?;
    tracing::debug!("user {} deleted by {}", user_id.trim(), caller_label(&caller));
    Ok(Json(json!({ "deleted": true })))
}

fn caller_label(caller: &Caller) -> &str {
    caller.user_id().unwrap_or("service")
}
