//! Handler, middleware and request context types
//!
//! Handlers answer with a two-armed [`HandlerResult`]: `Ok` for the success
//! arm, `Err` for the alternate arm. Both arms carry a full [`Response`], so
//! the dispatcher sends either one unchanged.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use futures::future::BoxFuture;
use futures::FutureExt;
use pathway_router::Params;

/// Request with a fully buffered body
pub type Request = axum::http::Request<Bytes>;

/// Response with a fully buffered body
pub type Response = axum::http::Response<Bytes>;

/// Success or alternate outcome, both already a response
pub type HandlerResult = Result<Response, Response>;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// Type-erased async request handler
pub type Handler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Wraps a handler into another handler
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Boxes an async function into a [`Handler`]
///
/// ```ignore
/// let hello = handler(|_ctx| async { Ok(response::text("hello")) });
/// ```
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext| f(ctx).boxed())
}

/// Boxes a handler transformer into a [`Middleware`]
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Application state shared with every handler
///
/// The dispatcher only hands it out; synchronising any mutation inside is
/// up to the application.
#[derive(Clone, Default)]
pub struct AppState(Option<Arc<dyn Any + Send + Sync>>);

impl AppState {
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Some(Arc::new(state)))
    }

    /// Typed access to the state, `None` when absent or of another type
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AppState")
            .field(&if self.0.is_some() { "<state>" } else { "<none>" })
            .finish()
    }
}

/// Everything a handler receives for one request
pub struct RequestContext {
    pub request: Request,

    /// Decoded captures of the matched route; empty for the default handler
    pub params: Params,

    pub state: AppState,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("params", &self.params)
            .finish()
    }
}

impl RequestContext {
    pub fn new(request: Request, params: Params, state: AppState) -> Self {
        Self {
            request,
            params,
            state,
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Get a captured path parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Typed application state
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.get::<T>()
    }
}
