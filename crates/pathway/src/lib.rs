// Pathway - convention-based site builder and request router
// Walks a route directory, classifies every file, bundles client pages and
// dispatches requests over the assembled route table.

pub mod error;
pub mod config;
pub mod walker;
pub mod module;
pub mod route;

// Build pipeline
pub mod classify;
pub mod assemble;
pub mod client;
pub mod builder;

// Serving
pub mod handler;
pub mod response;
pub mod middleware;
pub mod dispatch;
pub mod server;

// Re-export the build surface
pub use builder::{Site, SiteBuilder};
pub use config::{ClientConfig, JsxMode, ServerConfig, SiteConfig};
pub use error::{BuildError, BuildPhase, ConflictRecord};
pub use module::{ClientPage, Export, ModuleExports, ModuleLoader, ModuleRegistry, PartialRoute};
pub use route::{ClientPageEntry, RouteDefinition, RouteKind, SiteRouteSet, SpecialFiles, SpecialSlot, TaggedRoute};
pub use walker::{walk_files, FileDescriptor};

// Re-export client build types
pub use client::{BundleOutput, BundleRequest, Bundler, DefaultShell, EsbuildBundler, ShellContext, ShellRenderer};

// Re-export serving types
pub use dispatch::{DispatchOptions, Dispatcher};
pub use handler::{handler, middleware, AppState, Handler, HandlerResult, Middleware, Request, RequestContext, Response};
pub use middleware::trace_requests;
pub use server::{into_router, serve};

// Re-export path utilities
pub use pathway_router::{compare_precedence, compare_specificity, count_params, parse_path, Params, PathPattern};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::{Method, StatusCode};
