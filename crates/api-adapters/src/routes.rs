//! # Route table
//!
//! Every endpoint is one [`RouteSpec`] row: verb, path, identity requirement
//! and handler. [`build_router`] turns the table into an axum `Router`,
//! attaching the identity check to exactly the rows that declare it.

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::handler::Handler;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{board, comment, health, like};
use crate::identity::{require_identity, resolve_identity};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Identity precondition of a route.
///
/// `Public` and `OptionalIdentity` both let anonymous callers through; the
/// distinction records whether the handler reads the identity at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    OptionalIdentity,
    RequiredIdentity,
}

pub struct RouteSpec {
    pub verb: Verb,
    /// Relative to `/api`.
    pub path: &'static str,
    pub access: Access,
    handler: MethodRouter<AppState>,
}

impl RouteSpec {
    pub fn new<H, T>(verb: Verb, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self {
            verb,
            path,
            access,
            handler: on(verb.filter(), handler),
        }
    }

    fn into_method_router(self) -> MethodRouter<AppState> {
        match self.access {
            Access::RequiredIdentity => self.handler.route_layer(from_fn(require_identity)),
            Access::Public | Access::OptionalIdentity => self.handler,
        }
    }
}

pub fn route_table() -> Vec<RouteSpec> {
    use Access::*;
    use Verb::*;

    vec![
        RouteSpec::new(Get, "/health", Public, health::health),
        RouteSpec::new(Get, "/metrics", Public, health::metrics),
        RouteSpec::new(Post, "/board/add", RequiredIdentity, board::add),
        RouteSpec::new(Get, "/board/list", Public, board::list),
        RouteSpec::new(Get, "/board/{id}", Public, board::get),
        RouteSpec::new(Put, "/board/{id}", RequiredIdentity, board::update),
        RouteSpec::new(Delete, "/board/{id}", RequiredIdentity, board::delete),
        RouteSpec::new(Post, "/comment", RequiredIdentity, comment::add),
        RouteSpec::new(Get, "/comment/list", Public, comment::list),
        RouteSpec::new(Put, "/comment/{id}", RequiredIdentity, comment::update),
        RouteSpec::new(Delete, "/comment/{id}", RequiredIdentity, comment::delete),
        RouteSpec::new(Put, "/like", RequiredIdentity, like::toggle),
        RouteSpec::new(Get, "/like/board/{boardId}", OptionalIdentity, like::get),
    ]
}

/// Transport settings taken from the server config.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// `*` allows any origin; empty disables cross-origin access.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

pub fn build_router(state: AppState, options: &HttpOptions) -> Router {
    let api = route_table()
        .into_iter()
        .fold(Router::new(), |router, spec| {
            let path = spec.path;
            router.route(path, spec.into_method_router())
        });

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(from_fn_with_state(state.clone(), resolve_identity))
        .layer(from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&options.cors_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    state
        .metrics
        .observe_request(method.as_str(), response.status().as_u16());
    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}
