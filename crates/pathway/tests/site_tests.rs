//! End-to-end build and dispatch tests
//!
//! Every test lays out a small route directory on disk, registers the
//! exports of its code files, builds the site and checks the resulting
//! table or the responses served from it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use pathway::{
    handler, into_router, middleware, BuildError, BundleOutput, BundleRequest, Bundler,
    ClientPage, Export, Handler, Method, ModuleExports, ModuleRegistry, Request, RequestContext,
    RouteKind, ShellContext, SiteBuilder, SiteConfig, StatusCode,
};
use pathway::response;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// Fixtures
// ============================================================================

fn site(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
    dir
}

fn text(body: &'static str) -> Handler {
    handler(move |_ctx| async move { Ok(response::text(body)) })
}

fn get(uri: &str) -> Request {
    axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

fn table(routes: &[pathway::TaggedRoute]) -> Vec<(String, String)> {
    routes
        .iter()
        .map(|r| (r.method().to_string(), r.pathname().to_string()))
        .collect()
}

/// Stands in for esbuild: one script and one stylesheet per build
#[derive(Default)]
struct FakeBundler {
    entries: Mutex<Vec<String>>,
}

#[async_trait]
impl Bundler for FakeBundler {
    async fn bundle(&self, request: &BundleRequest) -> anyhow::Result<Vec<BundleOutput>> {
        let source = std::fs::read_to_string(&request.entrypoint)?;
        self.entries.lock().unwrap().push(source);
        Ok(vec![
            BundleOutput::new("entry-4F2A.js", "console.log('app')"),
            BundleOutput::new("entry-4F2A.css", "body{margin:0}"),
        ])
    }
}

struct SharedBundler(Arc<FakeBundler>);

#[async_trait]
impl Bundler for SharedBundler {
    async fn bundle(&self, request: &BundleRequest) -> anyhow::Result<Vec<BundleOutput>> {
        self.0.bundle(request).await
    }
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .unwrap()
        .filter_map(Result::ok)
        .all(|e| !e.file_name().to_string_lossy().starts_with(".pathway-build-"))
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_single_server_file() {
    let dir = site(&[("about.ts", "")]);
    let registry = ModuleRegistry::new().register("about.ts", ModuleExports::new().method("GET", text("about")));

    let site = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap();

    assert_eq!(table(site.routes()), vec![("GET".to_string(), "/about".to_string())]);
    assert_eq!(site.routes()[0].kind, RouteKind::Server);
    assert_eq!(site.routes()[0].source_path, PathBuf::from("about.ts"));
}

#[tokio::test]
async fn test_single_static_file() {
    let dir = site(&[("styles.css", "body { color: red }")]);

    let site = SiteBuilder::new(SiteConfig::new(dir.path())).build().await.unwrap();
    assert_eq!(table(site.routes()), vec![("GET".to_string(), "/styles.css".to_string())]);

    let res = site.dispatcher().handle(get("/styles.css")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/css; charset=utf-8");
    assert_eq!(res.headers()["content-length"], "19");
    assert_eq!(res.body(), &Bytes::from("body { color: red }"));
}

#[tokio::test]
async fn test_nested_params_and_ordering() {
    let dir = site(&[
        ("users.ts", ""),
        ("users/:id.ts", ""),
        ("users/:id/*.ts", ""),
        ("logo.svg", "<svg/>"),
    ]);
    let registry = ModuleRegistry::new()
        .register("users.ts", ModuleExports::new().method("GET", text("list")))
        .register("users/:id.ts", ModuleExports::new().method("GET", text("show")))
        .register("users/:id/*.ts", ModuleExports::new().method("GET", text("rest")));

    let site = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap();

    let paths: Vec<&str> = site.routes().iter().map(|r| r.pathname()).collect();
    assert_eq!(paths, vec!["/users", "/users/:id", "/users/:id/*", "/logo.svg"]);
}

#[tokio::test]
async fn test_missing_root_is_walk_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SiteBuilder::new(SiteConfig::new(dir.path().join("nope")))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Walk { .. }));
}

// ============================================================================
// Conflicts
// ============================================================================

#[tokio::test]
async fn test_two_get_routes_on_same_path_conflict() {
    let dir = site(&[("users.ts", ""), ("users.js", "")]);
    let registry = ModuleRegistry::new()
        .register("users.ts", ModuleExports::new().method("GET", text("a")))
        .register("users.js", ModuleExports::new().method("GET", text("b")));

    let err = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap_err();

    let conflict = err.conflict().expect("conflict error");
    assert_eq!(conflict.path, "/users");
    assert_eq!(conflict.method, Method::GET);
    assert_eq!(
        conflict.sources,
        vec![PathBuf::from("users.js"), PathBuf::from("users.ts")]
    );
}

#[tokio::test]
async fn test_get_and_post_on_same_path_build() {
    let dir = site(&[("users.ts", ""), ("users.js", "")]);
    let registry = ModuleRegistry::new()
        .register("users.ts", ModuleExports::new().method("GET", text("list")))
        .register("users.js", ModuleExports::new().method("POST", text("create")));

    let site = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap();
    assert_eq!(site.routes().len(), 2);
}

#[tokio::test]
async fn test_server_route_and_client_page_conflict() {
    let dir = site(&[("users.ts", ""), ("users.tsx", "")]);
    let registry = ModuleRegistry::new()
        .register("users.ts", ModuleExports::new().method("GET", text("list")))
        .register(
            "users.tsx",
            ModuleExports::new().with("page", Export::ClientPage(ClientPage::new())),
        );
    let bundler = Arc::new(FakeBundler::default());

    let err = SiteBuilder::new(SiteConfig::new(dir.path()).with_client(true))
        .loader(registry)
        .bundler(SharedBundler(bundler.clone()))
        .build()
        .await
        .unwrap_err();

    let conflict = err.conflict().expect("conflict error");
    assert_eq!(conflict.path, "/users");
    assert_eq!(
        conflict.sources,
        vec![PathBuf::from("users.ts"), PathBuf::from("users.tsx")]
    );
    assert!(bundler.entries.lock().unwrap().is_empty(), "bundler must not run");
}

// ============================================================================
// Client build
// ============================================================================

#[tokio::test]
async fn test_client_page_yields_shell_routes() {
    let dir = site(&[("dashboard.tsx", "")]);
    let registry = ModuleRegistry::new().register(
        "dashboard.tsx",
        ModuleExports::new()
            .with("page", Export::ClientPage(ClientPage::titled("Dashboard")))
            .with("default", Export::Component),
    );
    let bundler = Arc::new(FakeBundler::default());

    let site = SiteBuilder::new(SiteConfig::new(dir.path()).with_client(true))
        .loader(registry)
        .bundler(SharedBundler(bundler.clone()))
        .build()
        .await
        .unwrap();

    let routes = table(site.routes());
    for path in ["/dashboard", "/", "/index.html", "/*"] {
        assert!(
            routes.contains(&("GET".to_string(), path.to_string())),
            "missing GET {}",
            path
        );
    }

    let dispatcher = site.dispatcher();
    for uri in ["/dashboard", "/", "/index.html", "/settings/profile"] {
        let res = dispatcher.handle(get(uri)).await;
        assert_eq!(res.status(), StatusCode::OK, "{}", uri);
        assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8", "{}", uri);
        let html = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(html.contains(r#"<script type="module" src="/entry-4F2A.js"></script>"#));
        assert!(html.contains(r#"<link rel="stylesheet" href="/entry-4F2A.css">"#));
    }

    let script = dispatcher.handle(get("/entry-4F2A.js")).await;
    assert_eq!(script.headers()["content-type"], "text/javascript; charset=utf-8");

    let entries = bundler.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].contains("import PageDashboard from"));
    assert!(is_empty_dir(dir.path()), "scratch dir left behind");
}

#[tokio::test]
async fn test_custom_renderer_is_used_for_shell() {
    let dir = site(&[("home.tsx", "")]);
    let registry = ModuleRegistry::new().register(
        "home.tsx",
        ModuleExports::new().with("page", Export::ClientPage(ClientPage::new())),
    );

    let site = SiteBuilder::new(SiteConfig::new(dir.path()).with_client(true))
        .loader(registry)
        .bundler(FakeBundler::default())
        .renderer(|shell: &ShellContext| -> anyhow::Result<String> {
            Ok(format!("<main>{}</main>", shell.scripts.join(" ")))
        })
        .build()
        .await
        .unwrap();

    let res = site.dispatcher().handle(get("/anything")).await;
    assert_eq!(res.body(), &Bytes::from("<main>/entry-4F2A.js</main>"));
}

#[tokio::test]
async fn test_client_build_disabled_skips_pages() {
    let dir = site(&[("dashboard.tsx", "")]);
    let registry = ModuleRegistry::new().register(
        "dashboard.tsx",
        ModuleExports::new().with("page", Export::ClientPage(ClientPage::new())),
    );

    let site = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .bundler(FakeBundler::default())
        .build()
        .await
        .unwrap();
    assert!(site.routes().is_empty());
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_dispatch_prefers_specific_route() {
    let dir = site(&[("users.ts", ""), ("users/:id.ts", "")]);
    let show = handler(|ctx: RequestContext| async move {
        Ok(response::text(format!("user {}", ctx.param("id").unwrap_or("?"))))
    });
    let registry = ModuleRegistry::new()
        .register("users.ts", ModuleExports::new().method("GET", text("all users")))
        .register("users/:id.ts", ModuleExports::new().method("GET", show));

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap()
        .into_dispatcher();

    let all = dispatcher.handle(get("/users")).await;
    assert_eq!(all.body(), &Bytes::from("all users"));

    let one = dispatcher.handle(get("/users/42")).await;
    assert_eq!(one.body(), &Bytes::from("user 42"));
}

#[tokio::test]
async fn test_root_wildcard_does_not_shadow_params() {
    let dir = site(&[("*.ts", ""), ("users/:id.ts", "")]);
    let registry = ModuleRegistry::new()
        .register("*.ts", ModuleExports::new().method("GET", text("catchall")))
        .register("users/:id.ts", ModuleExports::new().method("GET", text("user")));

    let site = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap();

    let paths: Vec<&str> = site.routes().iter().map(|r| r.pathname()).collect();
    assert_eq!(paths, vec!["/users/:id", "/*"]);

    let dispatcher = site.into_dispatcher();
    assert_eq!(dispatcher.handle(get("/users/42")).await.body(), &Bytes::from("user"));
    assert_eq!(dispatcher.handle(get("/elsewhere")).await.body(), &Bytes::from("catchall"));
}

#[tokio::test]
async fn test_panicking_handler_returns_500() {
    let dir = site(&[("boom.ts", "")]);
    let boom = handler(|_ctx| async {
        if true {
            panic!("handler exploded");
        }
        Ok(response::text("never"))
    });
    let registry = ModuleRegistry::new().register("boom.ts", ModuleExports::new().method("GET", boom));

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap()
        .into_dispatcher();

    let res = dispatcher.handle(get("/boom")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), &Bytes::from("Internal Server Error"));
}

#[tokio::test]
async fn test_middleware_wraps_routes_and_default_handler() {
    let dir = site(&[("ping.ts", "")]);
    let registry = ModuleRegistry::new().register("ping.ts", ModuleExports::new().method("GET", text("pong")));
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));

    let log = seen.clone();
    let record = middleware(move |next: Handler| {
        let log = log.clone();
        handler(move |ctx: RequestContext| {
            log.lock().unwrap().push(ctx.path().to_string());
            next(ctx)
        })
    });

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .middleware(record)
        .middleware(pathway::trace_requests())
        .default_handler(handler(|_ctx| async {
            Err(response::with_status(StatusCode::NOT_FOUND, "custom miss", None))
        }))
        .build()
        .await
        .unwrap()
        .into_dispatcher();

    assert_eq!(dispatcher.handle(get("/ping")).await.body(), &Bytes::from("pong"));
    let miss = dispatcher.handle(get("/missing")).await;
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);
    assert_eq!(miss.body(), &Bytes::from("custom miss"));

    assert_eq!(*seen.lock().unwrap(), vec!["/ping".to_string(), "/missing".to_string()]);
}

#[tokio::test]
async fn test_state_is_shared_with_handlers() {
    struct Version(&'static str);

    let dir = site(&[("version.ts", "")]);
    let version = handler(|ctx: RequestContext| async move {
        let v = ctx.state::<Version>().map(|v| v.0).unwrap_or("unknown");
        Ok(response::text(v))
    });
    let registry = ModuleRegistry::new().register("version.ts", ModuleExports::new().method("GET", version));

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .state(Version("1.2.3"))
        .build()
        .await
        .unwrap()
        .into_dispatcher();

    assert_eq!(dispatcher.handle(get("/version")).await.body(), &Bytes::from("1.2.3"));
}

// ============================================================================
// Host adapter
// ============================================================================

#[tokio::test]
async fn test_axum_router_forwards_to_dispatcher() {
    let dir = site(&[("echo.ts", "")]);
    let echo = handler(|ctx: RequestContext| async move {
        Ok(response::text(ctx.request.body().clone()))
    });
    let registry = ModuleRegistry::new().register("echo.ts", ModuleExports::new().method("POST", echo));

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap()
        .into_dispatcher();
    let app = into_router(Arc::new(dispatcher), 16);

    let ok = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = axum::body::to_bytes(ok.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, Bytes::from("hello"));

    let too_big = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from("this body is longer than sixteen bytes"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_axum_router_rejects_broken_body_with_400() {
    let dir = site(&[("echo.ts", "")]);
    let registry = ModuleRegistry::new().register("echo.ts", ModuleExports::new().method("POST", text("unused")));

    let dispatcher = SiteBuilder::new(SiteConfig::new(dir.path()))
        .loader(registry)
        .build()
        .await
        .unwrap()
        .into_dispatcher();
    let app = into_router(Arc::new(dispatcher), 1024);

    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from("partial")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
    ];
    let res = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from_stream(futures::stream::iter(chunks)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
