//! Request dispatcher
//!
//! Built once from the assembled route table and never mutated afterwards.
//! Routes are indexed by method; within a method the first pattern that
//! matches wins, so the order handed in decides between overlapping routes.
//!
//! Every handler runs inside one fault boundary: a panic anywhere in the
//! middleware chain or handler is logged and answered with a generic 500.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use axum::http::Method;
use futures::FutureExt;
use pathway_router::{normalize_path, Params, PathPattern};
use tracing::{debug, error};

use crate::handler::{handler, AppState, Handler, Middleware, Request, RequestContext, Response};
use crate::middleware::compose;
use crate::response;
use crate::route::RouteDefinition;

/// Inputs applied to every route when the dispatcher is built
#[derive(Clone, Default)]
pub struct DispatchOptions {
    /// Applied in order; the first is the outermost wrapper
    pub middlewares: Vec<Middleware>,

    /// Answers unmatched requests; a plain 404 when absent
    pub default_handler: Option<Handler>,

    pub state: AppState,
}

struct CompiledRoute {
    pattern: PathPattern,
    handler: Handler,
}

pub struct Dispatcher {
    index: HashMap<Method, Vec<CompiledRoute>>,
    fallback: Handler,
    state: AppState,
    listing: Vec<(Method, String)>,
}

impl Dispatcher {
    /// Indexes `routes` by method, keeping their order within each method
    pub fn new(routes: impl IntoIterator<Item = RouteDefinition>, options: DispatchOptions) -> Self {
        let DispatchOptions {
            middlewares,
            default_handler,
            state,
        } = options;

        let mut index: HashMap<Method, Vec<CompiledRoute>> = HashMap::new();
        let mut listing = Vec::new();

        for route in routes {
            listing.push((route.method.clone(), route.pathname.clone()));
            index.entry(route.method).or_default().push(CompiledRoute {
                pattern: route.pattern,
                handler: compose(&middlewares, route.handler),
            });
        }

        let fallback = default_handler
            .unwrap_or_else(|| handler(|_ctx| async { Err(response::not_found()) }));

        Self {
            index,
            fallback: compose(&middlewares, fallback),
            state,
            listing,
        }
    }

    /// `(method, pathname)` of every route, in evaluation order
    pub fn routes(&self) -> &[(Method, String)] {
        &self.listing
    }

    pub fn len(&self) -> usize {
        self.listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }

    /// Handler and decoded params for a request, or the default handler
    fn resolve(&self, method: &Method, path: &str) -> (Handler, Params) {
        if let Some(routes) = self.index.get(method) {
            for route in routes {
                if let Some(params) = route.pattern.matches(path) {
                    debug!("{} {} matched {}", method, path, route.pattern);
                    return (route.handler.clone(), decode_params(params));
                }
            }
        }
        (self.fallback.clone(), Params::new())
    }

    /// Serves one request; never fails and never panics
    pub async fn handle(&self, request: Request) -> Response {
        let method = canonical_method(request.method());
        let path = normalize_path(request.uri().path()).into_owned();
        let (handler, params) = self.resolve(&method, &path);

        let ctx = RequestContext::new(request, params, self.state.clone());
        run_guarded(handler, ctx, &method, &path).await
    }
}

async fn run_guarded(handler: Handler, ctx: RequestContext, method: &Method, path: &str) -> Response {
    let outcome = AssertUnwindSafe(async move { handler(ctx).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(response)) | Ok(Err(response)) => response,
        Err(panic) => {
            error!(
                severity = "fatal",
                method = %method,
                path = %path,
                "handler panicked: {}",
                panic_message(panic.as_ref())
            );
            response::internal_error()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Uppercases extension methods; standard methods pass through
fn canonical_method(method: &Method) -> Method {
    let raw = method.as_str();
    if !raw.bytes().any(|b| b.is_ascii_lowercase()) {
        return method.clone();
    }
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).unwrap_or_else(|_| method.clone())
}

fn decode_params(params: Params) -> Params {
    params
        .into_iter()
        .map(|(name, value)| {
            let decoded = match urlencoding::decode(&value) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => value,
            };
            (name, decoded)
        })
        .collect()
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.listing)
            .finish_non_exhaustive()
    }
}
