use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Extension, Path, RawQuery, State,
    },
    http::Method,
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::filter::{parse_list_query, SortSpec};
use crate::middleware::Collection;
use crate::resources::normalize_payload;
use crate::types::{RequestContext, Verb};

use super::parse_json_body;

/// ANY /:resource
pub async fn collection(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    resource: Result<Path<String>, PathRejection>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Value>> {
    let (Path(resource), body) = (resource?, body?);
    let ctx = build_context(method, resource, collection, None, query, &body)?;
    Ok(Json(state.resource_service.execute(ctx).await?))
}

/// ANY /:resource/:id
pub async fn record(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    path: Result<Path<(String, String)>, PathRejection>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Value>> {
    let (Path((resource, id)), body) = (path?, body?);
    let ctx = build_context(method, resource, collection, Some(id), query, &body)?;
    Ok(Json(state.resource_service.execute(ctx).await?))
}

fn build_context(
    method: Method,
    resource: String,
    collection: &'static str,
    id: Option<String>,
    query: Option<String>,
    body: &Bytes,
) -> ApiResult<RequestContext> {
    let verb = Verb::from_method(&method, id.is_some()).ok_or_else(ApiError::not_found)?;

    // Sort and filters only shape listings
    let (sort, filters) = match verb {
        Verb::List => parse_list_query(query.as_deref()),
        _ => (SortSpec::default(), Vec::new()),
    };

    let needs_body = match verb {
        Verb::Create => true,
        Verb::Update => id.is_some(),
        _ => false,
    };
    let body = if needs_body {
        Some(normalize_payload(parse_json_body(body)?))
    } else {
        None
    };

    Ok(RequestContext { verb, resource, collection, id, sort, filters, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_with_id_is_not_a_route() {
        let err = build_context(Method::POST, "quotes".into(), "quotes", Some("1".into()), None, &Bytes::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn listing_reads_sort_and_filters() {
        let ctx = build_context(
            Method::GET,
            "quotes".into(),
            "quotes",
            None,
            Some("sort=total&status=open".into()),
            &Bytes::new(),
        )
        .unwrap();
        assert_eq!(ctx.verb, Verb::List);
        assert!(ctx.sort.is_ascending());
        assert_eq!(ctx.filters.len(), 1);
        assert!(ctx.body.is_none());
    }

    #[test]
    fn write_bodies_are_normalized() {
        let ctx = build_context(
            Method::PUT,
            "quotes".into(),
            "quotes",
            Some("1".into()),
            None,
            &Bytes::from_static(br#"{"customer_id": ""}"#),
        )
        .unwrap();
        assert_eq!(ctx.body, Some(json!({ "customer_id": null })));
    }

    #[test]
    fn update_without_id_skips_body_parsing() {
        // missing_id is reported by the service even when the body is malformed
        let ctx = build_context(Method::PUT, "quotes".into(), "quotes", None, None, &Bytes::from_static(b"{"))
            .unwrap();
        assert_eq!(ctx.verb, Verb::Update);
        assert!(ctx.body.is_none());
    }
}
