use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::auth::{AuthGate, AuthProvider, SharedSecret};
use crate::database::{ProfileRepository, Store};
use crate::error::ApiError;
use crate::handlers::{self, admin, resources};
use crate::middleware::{cors_middleware, require_admin, require_session, resolve_resource};
use crate::resources::ResourceMap;
use crate::services::{ResourceService, UserService};

/// Legacy prefix accepted as an alias of `/api`.
pub const LEGACY_PREFIX: &str = "/api/index";
pub const API_PREFIX: &str = "/api";

const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<ResourceMap>,
    pub gate: AuthGate,
    pub resource_service: ResourceService,
    pub users: UserService,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn AuthProvider>, shared_secret: Option<SharedSecret>) -> Self {
        let profiles = ProfileRepository::new(store.clone());
        Self {
            resources: Arc::new(ResourceMap::new()),
            gate: AuthGate::new(shared_secret, provider.clone(), Arc::new(profiles.clone())),
            resource_service: ResourceService::new(store),
            users: UserService::new(provider, profiles),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}

/// Full HTTP surface: `/api` plus its legacy alias, CORS, tracing and panic capture.
pub fn router(state: AppState) -> Router {
    let api = api_routes(state.clone());

    Router::new()
        .nest(API_PREFIX, api.clone())
        .nest(LEGACY_PREFIX, api)
        .fallback(handlers::not_found)
        .layer(
            // Outermost first: CORS headers land on every response, panics included
            ServiceBuilder::new()
                .layer(from_fn(cors_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(DefaultBodyLimit::max(state.body_limit)),
        )
}

fn api_routes(state: AppState) -> Router {
    let admin_users = Router::new()
        .route(
            "/admin/users",
            get(admin::list_users)
                .post(admin::create_user)
                .delete(admin::delete_user)
                .fallback(handlers::not_found),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    // Layers run bottom-up: the slug is resolved before the caller is authenticated
    let domain = Router::new()
        .route("/:resource", any(resources::collection))
        .route("/:resource/:id", any(resources::record))
        .route_layer(from_fn_with_state(state.clone(), require_session))
        .route_layer(from_fn_with_state(state.clone(), resolve_resource));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/admin/bootstrap", post(admin::bootstrap).fallback(handlers::not_found))
        .merge(admin_users)
        .merge(domain)
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected panic".to_string()
    };
    tracing::error!("handler panicked: {}", message);
    ApiError::internal_server_error(message).into_response()
}
