// Route handlers
//
// health          GET  /health                    (public)
// admin::bootstrap POST /admin/bootstrap          (verified user)
// admin::users    GET|POST|DELETE /admin/users    (admin or shared secret)
// resources       ANY  /:resource[/:id]           (session or shared secret)
pub mod admin;
pub mod health;
pub mod resources;

use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Read a JSON request body; an empty body reads as `{}`.
pub(crate) fn parse_json_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("rejecting malformed body: {}", e);
        ApiError::bad_request("invalid_json")
    })
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(parse_json_body(&Bytes::new()).unwrap(), json!({}));
        assert_eq!(parse_json_body(&Bytes::from_static(b"  \n")).unwrap(), json!({}));
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        let err = parse_json_body(&Bytes::from_static(b"{nope")).unwrap_err();
        assert_eq!(err.to_json(), json!({ "error": "invalid_json" }));
    }
}
